// File names of the data directory, and the CSV primitives shared by the readers.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::pipeline::*;

pub const HOUSE_RESULTS_FILE: &str = "1976-2018-house2.csv";
pub const SCRAPED_RESULTS_FILE: &str = "2020-house.csv";
pub const RESULTS_PAGES_DIR: &str = "2020-house-pages";
pub const PRES_2016_FILE: &str = "2016-precinct-president.csv";
pub const PRES_2012_FILE: &str = "2012-precinct-president.csv";
pub const PRES_POLL_XLSX: &str = "11.02-MCPI-National-and-Senate-Data.xlsx";
pub const PRES_POLL_CSV: &str = "11.02-MCPI-National-and-Senate-Data.csv";
pub const PRES_POLL_SHEET: &str = "National Presidential";
pub const HOUSE_POLL_PDF: &str = "monmouthpoll_us_091020.pdf";
pub const HOUSE_POLL_CSV: &str = "monmouthpoll_us_091020.csv";
pub const FEATURES_FILE: &str = "features_house.csv";
pub const HOUSE_CHANGES_FILE: &str = "house_changes.csv";

pub fn census_group_file(year: u32, group: &str) -> String {
    format!("census-by-congress_{}{}.csv", year, group)
}

pub fn parsed_census_file(year: u32) -> String {
    format!("parsed_census-by-congress_{}.csv", year)
}

pub fn exit_poll_file(key: &str) -> String {
    format!("exitpolls_{}.json", key)
}

pub fn parsed_exit_poll_file(key: &str) -> String {
    format!("parsed_exitpolls_{}.csv", key)
}

pub fn final_data_file(year: u32) -> String {
    format!("final_data_{}h.csv", year)
}

pub fn path_str(p: &Path) -> String {
    p.display().to_string()
}

pub fn data_path(data_dir: &Path, file_name: &str) -> PathBuf {
    data_dir.join(file_name)
}

/// Opens a CSV file whose first line is a header.
pub fn csv_reader(path: &Path) -> PrepResult<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_str(path),
        })
}

/// All the lines of a CSV file, header line included.
pub fn read_raw_records(path: &Path) -> PrepResult<Vec<Vec<String>>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_str(path),
        })?;
    let mut res: Vec<Vec<String>> = Vec::new();
    for line_r in rdr.into_records() {
        let line = line_r.context(CsvLineParseSnafu {
            path: path_str(path),
        })?;
        res.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(res)
}

/// Writes a header line and the rows. The file is replaced if it exists.
pub fn write_csv<I>(path: &Path, header: &[String], rows: I) -> PrepResult<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let p = path_str(path);
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p.clone() })?;
    wtr.write_record(header)
        .context(CsvWriteSnafu { path: p.clone() })?;
    let mut count = 0;
    for row in rows {
        wtr.write_record(&row)
            .context(CsvWriteSnafu { path: p.clone() })?;
        count += 1;
    }
    wtr.flush().context(WritingFileSnafu { path: p.clone() })?;
    debug!("write_csv: {} rows to {}", count, p);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_files_round_trip_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.csv");
        let header = vec!["question".to_string(), "answer".to_string()];
        let n = write_csv(
            &p,
            &header,
            vec![vec!["Income".to_string(), "Under $50,000".to_string()]],
        )
        .unwrap();
        assert_eq!(n, 1);
        let lines = read_raw_records(&p).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][1], "Under $50,000");
    }

    #[test]
    fn file_names() {
        assert_eq!(census_group_file(2019, "DP02"), "census-by-congress_2019DP02.csv");
        assert_eq!(parsed_exit_poll_file("2018h"), "parsed_exitpolls_2018h.csv");
        assert_eq!(final_data_file(2020), "final_data_2020h.csv");
    }
}
