// Downloads of the raw sources.
//
// A file present in the data directory is never fetched again, unless the
// refresh is forced. Failures are logged and leave no file behind; the next
// stages report what is missing.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use district_features::district::{state_names, state_slug};
use district_features::{census_download_years, CENSUS_GROUPS};
use serde_json::Value as JSValue;

use crate::pipeline::config_reader::{Settings, HOUSE_POLL_LINK, PRES_POLL_LINK};
use crate::pipeline::io_common::*;
use crate::pipeline::*;

/// The transport used by the fetcher.
pub trait HttpSource {
    fn get_bytes(&self, url: &str) -> PrepResult<Vec<u8>>;
}

pub struct BlockingHttp {
    client: reqwest::blocking::Client,
}

impl BlockingHttp {
    pub fn new() -> BlockingHttp {
        BlockingHttp {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl HttpSource for BlockingHttp {
    fn get_bytes(&self, url: &str) -> PrepResult<Vec<u8>> {
        info!("get_bytes: downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .context(HttpSnafu { url })?;
        let bytes = response.bytes().context(HttpSnafu { url })?;
        Ok(bytes.to_vec())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FetchOutcome {
    /// The file was already there.
    Cached,
    Written,
    Failed,
}

pub struct Fetcher<'a> {
    pub source: &'a dyn HttpSource,
    pub data_dir: PathBuf,
    pub force_refresh: bool,
    pub pacing: Duration,
}

impl<'a> Fetcher<'a> {
    pub fn new(source: &'a dyn HttpSource, settings: &Settings) -> Fetcher<'a> {
        Fetcher {
            source,
            data_dir: settings.data_dir.clone(),
            force_refresh: settings.force_refresh,
            pacing: settings.pacing,
        }
    }

    fn is_cached(&self, path: &Path) -> bool {
        !self.force_refresh && path.exists()
    }

    /// Writes the body of the response as is.
    pub fn fetch_raw(&self, url: &str, file_name: &str) -> FetchOutcome {
        let path = data_path(&self.data_dir, file_name);
        if self.is_cached(&path) {
            debug!("fetch_raw: {} already present", file_name);
            return FetchOutcome::Cached;
        }
        let res = self
            .source
            .get_bytes(url)
            .and_then(|body| write_bytes(&path, &body));
        report("fetch_raw", url, res)
    }

    /// The response must be a JSON array of arrays. Each inner array becomes
    /// a CSV line.
    pub fn fetch_json_as_csv(&self, url: &str, file_name: &str) -> FetchOutcome {
        let path = data_path(&self.data_dir, file_name);
        if self.is_cached(&path) {
            debug!("fetch_json_as_csv: {} already present", file_name);
            return FetchOutcome::Cached;
        }
        let res = self
            .source
            .get_bytes(url)
            .and_then(|body| json_table(&body, url))
            .and_then(|rows| {
                let mut it = rows.into_iter();
                let header = it.next().unwrap_or_default();
                write_csv(&path, &header, it).map(|_| ())
            });
        report("fetch_json_as_csv", url, res)
    }

    /// Fetches the items one after the other, waiting between two downloads.
    /// Items already present do not wait.
    pub fn fetch_paced(&self, items: &[(String, String)]) -> Vec<FetchOutcome> {
        let mut res: Vec<FetchOutcome> = Vec::new();
        let mut first_download = true;
        for (idx, (url, file_name)) in items.iter().enumerate() {
            if self.is_cached(&data_path(&self.data_dir, file_name)) {
                res.push(FetchOutcome::Cached);
                continue;
            }
            if !first_download {
                thread::sleep(self.pacing);
            }
            first_download = false;
            info!("fetch_paced: {} ({}/{})", file_name, idx + 1, items.len());
            res.push(self.fetch_raw(url, file_name));
        }
        res
    }

    /// Sources that have to be downloaded by hand: tells where to get them.
    pub fn check_manual(&self, file_name: &str, instructions: &[String]) -> FetchOutcome {
        let path = data_path(&self.data_dir, file_name);
        if !path.exists() {
            error!("check_manual: don't know how to download {}", file_name);
            for line in instructions.iter() {
                info!("check_manual:   {}", line);
            }
            FetchOutcome::Failed
        } else {
            if self.force_refresh {
                warn!("check_manual: skipping re-download of {}", file_name);
            }
            FetchOutcome::Cached
        }
    }
}

fn report(fn_name: &str, url: &str, res: PrepResult<()>) -> FetchOutcome {
    match res {
        Ok(()) => FetchOutcome::Written,
        Err(e) => {
            error!("{}: error downloading {}: {}", fn_name, url, e);
            FetchOutcome::Failed
        }
    }
}

fn write_bytes(path: &Path, body: &[u8]) -> PrepResult<()> {
    fs::write(path, body).context(WritingFileSnafu {
        path: path_str(path),
    })
}

fn json_cell(v: &JSValue) -> String {
    match v {
        JSValue::Null => String::new(),
        JSValue::String(s) => s.clone(),
        x => x.to_string(),
    }
}

fn json_table(body: &[u8], url: &str) -> PrepResult<Vec<Vec<String>>> {
    let js: JSValue = serde_json::from_slice(body).context(ParsingJsonSnafu { path: url })?;
    let rows = match js.as_array() {
        Some(rows) => rows,
        None => whatever!("Expected an array of rows from {}", url),
    };
    let mut res: Vec<Vec<String>> = Vec::new();
    for row in rows.iter() {
        match row.as_array() {
            Some(cells) => res.push(cells.iter().map(json_cell).collect()),
            None => whatever!("Expected an array of cells from {}, got {}", url, row),
        }
    }
    Ok(res)
}

fn fetch_census(fetcher: &Fetcher, settings: &Settings) {
    for year in census_download_years() {
        for group in CENSUS_GROUPS.iter() {
            fetcher.fetch_json_as_csv(
                &settings.census_url(year, group),
                &census_group_file(year, group),
            );
        }
    }
}

fn fetch_results(fetcher: &Fetcher, settings: &Settings) {
    fetcher.fetch_raw(&settings.house_results_url, HOUSE_RESULTS_FILE);
    fetcher.fetch_raw(&settings.presidential_2016_url, PRES_2016_FILE);
    fetcher.check_manual(
        PRES_2012_FILE,
        &[
            "no public source of the 2012 presidential results by district".to_string(),
            "please use R to get them".to_string(),
        ],
    );
}

fn fetch_exit_polls(fetcher: &Fetcher, settings: &Settings) {
    for (key, url) in settings.exit_polls.iter() {
        fetcher.fetch_raw(url, &exit_poll_file(key));
    }
}

fn fetch_pre_election_polls(fetcher: &Fetcher) {
    let xlsx = data_path(&fetcher.data_dir, PRES_POLL_XLSX);
    if !xlsx.exists() {
        fetcher.check_manual(
            PRES_POLL_CSV,
            &[
                format!("please download {}", PRES_POLL_LINK),
                format!("and save tab {} as csv", PRES_POLL_SHEET),
            ],
        );
    }
    fetcher.check_manual(
        HOUSE_POLL_CSV,
        &[
            format!("please download {}", HOUSE_POLL_LINK),
            format!(
                "and run through \"pdftotext -layout -f 15 -l 16 {} - | tr -d ',' | sed -e s'/   */,/g' > {}\"",
                HOUSE_POLL_PDF, HOUSE_POLL_CSV
            ),
        ],
    );
}

/// Caches the 2020 results page of every state.
pub fn fetch_results_pages(
    fetcher: &Fetcher,
    settings: &Settings,
) -> PrepResult<Vec<FetchOutcome>> {
    let dir = data_path(&fetcher.data_dir, RESULTS_PAGES_DIR);
    fs::create_dir_all(&dir).context(WritingFileSnafu {
        path: path_str(&dir),
    })?;
    let items: Vec<(String, String)> = state_names()
        .filter(|name| !TERRITORIES.contains(name))
        .map(|name| {
            let slug = state_slug(name);
            (
                settings.results_page_url(&slug),
                format!("{}/{}.html", RESULTS_PAGES_DIR, slug),
            )
        })
        .collect();
    let outcomes = fetcher.fetch_paced(&items);
    if !data_path(&fetcher.data_dir, SCRAPED_RESULTS_FILE).exists() {
        info!(
            "fetch_results_pages: {} is not present, extract it from the pages in {}",
            SCRAPED_RESULTS_FILE,
            path_str(&dir)
        );
    }
    Ok(outcomes)
}

// No house results pages for those.
const TERRITORIES: [&str; 5] = [
    "American Samoa",
    "Guam",
    "Northern Mariana Islands",
    "Puerto Rico",
    "Virgin Islands",
];

pub fn fetch_2020_pres_results() {
    warn!("fetch_2020_pres_results: not implemented yet, skipping");
}

pub fn fetch_all(source: &dyn HttpSource, settings: &Settings) -> PrepResult<()> {
    let fetcher = Fetcher::new(source, settings);
    fetch_census(&fetcher, settings);
    fetch_results(&fetcher, settings);
    fetch_exit_polls(&fetcher, settings);
    fetch_pre_election_polls(&fetcher);
    fetch_results_pages(&fetcher, settings)?;
    fetch_2020_pres_results();
    Ok(())
}
