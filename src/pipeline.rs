use log::{debug, error, info, warn};

use district_features::DistrictError;
use snafu::{prelude::*, Snafu};

use std::path::Path;

use crate::args::Args;
use crate::pipeline::config_reader::{read_config, PrepConfig, Settings, Stage};
use crate::pipeline::fetch::{BlockingHttp, HttpSource};
use crate::pipeline::io_common::path_str;

pub mod config_reader;
pub mod fetch;
pub mod io_census;
pub mod io_common;
pub mod io_exit_polls;
pub mod io_polls;
pub mod io_results;
pub mod join;

#[derive(Debug, Snafu)]
pub enum PrepError {
    #[snafu(display("Data directory {path} must exist"))]
    MissingDataDir { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing a line of {path}"))]
    CsvLineParse { source: csv::Error, path: String },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error parsing the JSON of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Empty worksheet"))]
    EmptyExcel {},
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("{source}"))]
    District { source: DistrictError },
    #[snafu(display("Error downloading {url}"))]
    Http { source: reqwest::Error, url: String },
    #[snafu(display("The census fields of cycle {year} do not produce the final schema"))]
    SchemaMismatch { year: u32 },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PrepResult<T> = Result<T, PrepError>;

fn parse_all(settings: &Settings) -> PrepResult<()> {
    let data_dir = settings.data_dir.as_path();
    for key in settings.exit_polls.keys() {
        io_exit_polls::parse_exit_poll_file(data_dir, key)?;
    }
    io_census::parse_all_census(data_dir)?;
    if let Err(e) = io_polls::convert_pre_election_polls(data_dir, settings.force_refresh) {
        error!("parse_all: the pre-election poll workbook was not converted: {}", e);
    }
    io_polls::parse_2020_pres_results();
    Ok(())
}

/// Runs the stages selected by the settings, in order.
pub fn run_stages(settings: &Settings, source: &dyn HttpSource) -> PrepResult<()> {
    let data_dir = settings.data_dir.as_path();
    ensure!(
        data_dir.is_dir(),
        MissingDataDirSnafu {
            path: path_str(data_dir)
        }
    );
    if settings.stage.runs(Stage::Fetch) {
        info!("run_stages: fetching into {}", path_str(data_dir));
        fetch::fetch_all(source, settings)?;
    }
    if settings.stage.runs(Stage::Parse) {
        info!("run_stages: parsing");
        parse_all(settings)?;
    }
    if settings.stage.runs(Stage::Join) {
        info!("run_stages: joining");
        join::join_house_data(data_dir)?;
        join::join_pres_data();
    }
    Ok(())
}

pub fn run_pipeline(args: &Args) -> PrepResult<()> {
    let config = match &args.config {
        Some(p) => read_config(p)?,
        None => PrepConfig::default(),
    };
    let settings = Settings::resolve(args, config)?;
    debug!("run_pipeline: settings: {:?}", settings);
    let http = BlockingHttp::new();
    run_stages(&settings, &http)
}
