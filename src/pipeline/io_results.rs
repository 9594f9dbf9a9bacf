// Readers for the house results: the historical results file and the
// scraped results of the current cycle.

use std::path::Path;

use district_features::{HouseResultRow, ScrapedResultRow};
use serde::Deserialize;

use crate::pipeline::io_common::*;
use crate::pipeline::*;

// The columns of 1976-2018-house2.csv that are used. The others are ignored.
#[derive(Debug, Clone, Deserialize)]
struct HouseLine {
    year: u32,
    stage: String,
    state_po: String,
    district: String,
    #[serde(default)]
    candidate: Option<String>,
    #[serde(default)]
    party: Option<String>,
    candidatevotes: String,
    totalvotes: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ScrapedLine {
    #[serde(rename = "district-name")]
    district_name: String,
    district: String,
    #[serde(rename = "dem-candidate", default)]
    dem_candidate: String,
    #[serde(rename = "gop-candidate", default)]
    gop_candidate: String,
    #[serde(rename = "dem-num", default)]
    dem_num: String,
    #[serde(rename = "gop-num", default)]
    gop_num: String,
}

/// Vote counts are sometimes written with thousands separators or left empty.
fn read_count(s: &str) -> u64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}

pub fn read_house_results(path: &Path) -> PrepResult<Vec<HouseResultRow>> {
    let mut rdr = csv_reader(path)?;
    let mut res: Vec<HouseResultRow> = Vec::new();
    for (idx, line_r) in rdr.deserialize::<HouseLine>().enumerate() {
        let line = match line_r {
            Ok(l) => l,
            Err(e) => {
                warn!("read_house_results: line {}: {}", idx + 2, e);
                continue;
            }
        };
        res.push(HouseResultRow {
            year: line.year,
            stage: line.stage,
            state_po: line.state_po,
            district: line.district,
            candidate: line.candidate.unwrap_or_default(),
            party: line.party.unwrap_or_default(),
            candidate_votes: read_count(&line.candidatevotes),
            total_votes: read_count(&line.totalvotes),
        });
    }
    info!(
        "read_house_results: {} lines in {}",
        res.len(),
        path_str(path)
    );
    Ok(res)
}

pub fn read_scraped_results(path: &Path) -> PrepResult<Vec<ScrapedResultRow>> {
    let mut rdr = csv_reader(path)?;
    let mut res: Vec<ScrapedResultRow> = Vec::new();
    for line_r in rdr.deserialize::<ScrapedLine>() {
        let line = line_r.context(CsvLineParseSnafu {
            path: path_str(path),
        })?;
        res.push(ScrapedResultRow {
            district_name: line.district_name,
            district: line.district,
            dem_candidate: line.dem_candidate,
            gop_candidate: line.gop_candidate,
            dem_votes: read_count(&line.dem_num),
            gop_votes: read_count(&line.gop_num),
        });
    }
    info!(
        "read_scraped_results: {} districts in {}",
        res.len(),
        path_str(path)
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn historical_results() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join(HOUSE_RESULTS_FILE);
        fs::write(
            &p,
            "year,state,state_po,state_fips,office,district,stage,special,candidate,party,writein,candidatevotes,totalvotes\n\
             2018,Alaska,AK,2,US House,0,gen,FALSE,Don Young,republican,FALSE,149779,282166\n\
             2018,Alaska,AK,2,US House,0,gen,FALSE,Alyse S. Galvin,,FALSE,131199,282166\n\
             2018,Alaska,AK,2,US House,0,gen,FALSE,,,TRUE,NA,282166\n\
             bad,line\n",
        )
        .unwrap();
        let rows = read_house_results(&p).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].candidate_votes, 149779);
        assert_eq!(rows[1].party, "");
        assert_eq!(rows[2].candidate_votes, 0);
        assert_eq!(rows[2].district, "0");
    }

    #[test]
    fn scraped_results() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join(SCRAPED_RESULTS_FILE);
        fs::write(
            &p,
            "district-name,district,dem-candidate,gop-candidate,dem-num,gop-num,dem-pct,gop-pct\n\
             Massachusetts's 1st district,MA-01,Richard Neal*,,\"1,000\",0,100,0\n",
        )
        .unwrap();
        let rows = read_scraped_results(&p).unwrap();
        assert_eq!(rows[0].district, "MA-01");
        assert_eq!(rows[0].dem_votes, 1000);
        assert_eq!(rows[0].gop_candidate, "");
    }
}
