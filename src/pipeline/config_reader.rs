use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::args::Args;
use crate::pipeline::*;

pub const DEFAULT_DATA_DIR: &str = "data/";
pub const DEFAULT_PACING_MILLIS: u64 = 1000;
pub const DEFAULT_CENSUS_API_BASE: &str = "https://api.census.gov/data";
// https://dataverse.harvard.edu/dataset.xhtml?persistentId=doi:10.7910/DVN/IG0UN2
pub const DEFAULT_HOUSE_RESULTS_URL: &str =
    "https://dataverse.harvard.edu/api/access/datafile/3814252?format=original&gbrecs=true";
// https://dataverse.harvard.edu/dataset.xhtml?persistentId=doi:10.7910/DVN/LYWX3D
pub const DEFAULT_PRES_2016_URL: &str =
    "https://dataverse.harvard.edu/api/access/datafile/3345331?format=original&gbrecs=true";
pub const DEFAULT_RESULTS_PAGE_BASE: &str = "https://www.politico.com/2020-election/results";
pub const PRES_POLL_LINK: &str = "https://assets.morningconsult.com/wp-uploads/2020/11/02093508/11.02-MCPI-National-and-Senate-Data.xlsx";
pub const HOUSE_POLL_LINK: &str =
    "https://www.monmouth.edu/polling-institute/documents/monmouthpoll_us_091020.pdf";

// The 2012 and 2014 files are JSONP.
const DEFAULT_EXIT_POLLS: &[(&str, &str)] = &[
    (
        "2020p",
        "https://politics-elex-results.data.api.cnn.io/results/exit-poll/2020-PG-XPOLLS-US.json",
    ),
    (
        "2020h",
        "https://politics-elex-results.data.api.cnn.io/results/exit-poll/2020-HG-XPOLLS-US.json",
    ),
    (
        "2018h",
        "https://data.cnn.com/ELECTION/2018November6/US/xpoll/Hfull.json",
    ),
    ("2016p", "https://data.cnn.com/ELECTION/2016/US/xpoll/Pfull.json"),
    ("2016h", "https://data.cnn.com/ELECTION/2016/US/xpoll/Hfull.json"),
    (
        "2014h",
        "http://data.cnn.com/jsonp/5s/ELECTION/2014/full/H.full.json?callback=callback_0",
    ),
    (
        "2012p",
        "https://data.cnn.com/jsonp/ELECTION/2012/full/P.full.json?callback=callback_0",
    ),
    (
        "2012h",
        "https://data.cnn.com/jsonp/ELECTION/2012/full/H.full.json?callback=callback_0",
    ),
];

/// The optional JSON configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrepConfig {
    #[serde(rename = "dataDir")]
    pub data_dir: Option<String>,
    #[serde(rename = "forceRefresh")]
    pub force_refresh: Option<bool>,
    #[serde(rename = "pacingMillis")]
    pub pacing_millis: Option<u64>,
    #[serde(rename = "censusApiBase")]
    pub census_api_base: Option<String>,
    #[serde(rename = "houseResultsUrl")]
    pub house_results_url: Option<String>,
    #[serde(rename = "presidential2016Url")]
    pub presidential_2016_url: Option<String>,
    /// Exit poll key (`2018h`) to URL. Merged over the default list.
    #[serde(rename = "exitPolls")]
    pub exit_polls: Option<BTreeMap<String, String>>,
    #[serde(rename = "resultsPageBase")]
    pub results_page_base: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Stage {
    Fetch,
    Parse,
    Join,
    All,
}

impl Stage {
    fn parse(s: &str) -> PrepResult<Stage> {
        match s {
            "fetch" => Ok(Stage::Fetch),
            "parse" => Ok(Stage::Parse),
            "join" => Ok(Stage::Join),
            "all" => Ok(Stage::All),
            x => whatever!("Unknown stage {:?}, expected fetch, parse, join or all", x),
        }
    }

    pub fn runs(&self, other: Stage) -> bool {
        *self == Stage::All || *self == other
    }
}

/// The resolved settings of a run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub force_refresh: bool,
    pub pacing: Duration,
    pub stage: Stage,
    pub census_api_base: String,
    pub house_results_url: String,
    pub presidential_2016_url: String,
    pub exit_polls: BTreeMap<String, String>,
    pub results_page_base: String,
}

impl Settings {
    /// Command line values take precedence over the configuration file.
    pub fn resolve(args: &Args, config: PrepConfig) -> PrepResult<Settings> {
        let stage = match &args.stage {
            Some(s) => Stage::parse(s)?,
            None => Stage::All,
        };
        let mut exit_polls: BTreeMap<String, String> = DEFAULT_EXIT_POLLS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(overrides) = config.exit_polls {
            exit_polls.extend(overrides);
        }
        let data_dir = args
            .data_dir
            .clone()
            .or(config.data_dir)
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Ok(Settings {
            data_dir: PathBuf::from(data_dir),
            force_refresh: args.force_refresh || config.force_refresh.unwrap_or(false),
            pacing: Duration::from_millis(config.pacing_millis.unwrap_or(DEFAULT_PACING_MILLIS)),
            stage,
            census_api_base: config
                .census_api_base
                .unwrap_or_else(|| DEFAULT_CENSUS_API_BASE.to_string()),
            house_results_url: config
                .house_results_url
                .unwrap_or_else(|| DEFAULT_HOUSE_RESULTS_URL.to_string()),
            presidential_2016_url: config
                .presidential_2016_url
                .unwrap_or_else(|| DEFAULT_PRES_2016_URL.to_string()),
            exit_polls,
            results_page_base: config
                .results_page_base
                .unwrap_or_else(|| DEFAULT_RESULTS_PAGE_BASE.to_string()),
        })
    }

    pub fn census_url(&self, year: u32, group: &str) -> String {
        format!(
            "{}/{}/acs/acs1/profile?get=NAME,group({})&for=congressional%20district:*",
            self.census_api_base, year, group
        )
    }

    pub fn results_page_url(&self, slug: &str) -> String {
        format!("{}/{}/house/", self.results_page_base, slug)
    }
}

pub fn read_config(path: &str) -> PrepResult<PrepConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: PrepConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            config: None,
            data_dir: None,
            force_refresh: false,
            stage: None,
            verbose: false,
        }
    }

    #[test]
    fn defaults() {
        let s = Settings::resolve(&args(), PrepConfig::default()).unwrap();
        assert_eq!(s.data_dir, PathBuf::from("data/"));
        assert_eq!(s.stage, Stage::All);
        assert_eq!(s.exit_polls.len(), 8);
        assert_eq!(
            s.census_url(2019, "DP02"),
            "https://api.census.gov/data/2019/acs/acs1/profile?get=NAME,group(DP02)&for=congressional%20district:*"
        );
        assert_eq!(
            s.results_page_url("massachusetts"),
            "https://www.politico.com/2020-election/results/massachusetts/house/"
        );
    }

    #[test]
    fn command_line_overrides_file() {
        let config: PrepConfig = serde_json::from_str(
            r#"{"dataDir": "/tmp/elections", "pacingMillis": 10, "exitPolls": {"2018h": "http://localhost/2018.json"}}"#,
        )
        .unwrap();
        let mut a = args();
        a.data_dir = Some("other/".to_string());
        a.stage = Some("join".to_string());
        let s = Settings::resolve(&a, config).unwrap();
        assert_eq!(s.data_dir, PathBuf::from("other/"));
        assert_eq!(s.pacing, Duration::from_millis(10));
        assert_eq!(s.exit_polls["2018h"], "http://localhost/2018.json");
        assert_eq!(s.exit_polls.len(), 8);
        assert!(s.stage.runs(Stage::Join));
        assert!(!s.stage.runs(Stage::Fetch));
    }

    #[test]
    fn unknown_stage() {
        let mut a = args();
        a.stage = Some("train".to_string());
        assert!(Settings::resolve(&a, PrepConfig::default()).is_err());
    }
}
