// The join stage: one table per house cycle, then the feature file of all
// the cycles in the final schema.

use std::path::Path;

use district_features::normalize::{derivable_columns, normalize_table, FeatureRow};
use district_features::{
    party_changes, run_cycle, CycleInputs, CycleResults, JoinedTable, ResultsSource, VoteHistory,
    HOUSE_CYCLES,
};
use text_diff::print_diff;

use crate::pipeline::io_census::{format_value, read_census_table};
use crate::pipeline::io_common::*;
use crate::pipeline::io_exit_polls::read_parsed_exit_poll;
use crate::pipeline::io_results::{read_house_results, read_scraped_results};
use crate::pipeline::*;

pub fn joined_header(table: &JoinedTable) -> Vec<String> {
    let mut h: Vec<String> = [
        "year",
        "state",
        "district",
        "dem",
        "rep",
        "tot",
        "incumbent",
        "prevparty",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    h.extend(table.census_fields.iter().cloned());
    h.extend(table.poll_columns.iter().cloned());
    h
}

pub fn write_joined_table(data_dir: &Path, table: &JoinedTable) -> PrepResult<usize> {
    let path = data_path(data_dir, &final_data_file(table.year));
    let rows = table.rows.iter().map(|r| {
        let mut row = vec![
            r.year.to_string(),
            r.key.state.clone(),
            r.key.district.to_string(),
            r.votes.dem.to_string(),
            r.votes.rep.to_string(),
            r.votes.total.to_string(),
            (r.votes.incumbent as u8).to_string(),
            r.prev_party.clone(),
        ];
        row.extend(
            table
                .census_fields
                .iter()
                .map(|f| format_value(r.census.get(f))),
        );
        row.extend(table.poll_columns.iter().map(|c| {
            r.poll_deltas
                .get(c)
                .map(|d| d.to_string())
                .unwrap_or_default()
        }));
        row
    });
    write_csv(&path, &joined_header(table), rows)
}

/// Fails when the census fields of a cycle cannot produce every final column.
pub fn check_schema(table: &JoinedTable) -> PrepResult<()> {
    let expected = FeatureRow::header();
    let found = derivable_columns(&table.census_fields);
    if found != expected {
        warn!("check_schema: cycle {} does not match the final schema", table.year);
        print_diff(
            expected.join("\n").as_str(),
            found.join("\n").as_str(),
            "\n",
        );
        return SchemaMismatchSnafu { year: table.year }.fail();
    }
    Ok(())
}

fn write_party_changes(data_dir: &Path, history: &VoteHistory) -> PrepResult<usize> {
    let (years, rows) = party_changes(history);
    let mut header = vec!["district".to_string()];
    header.extend(years.iter().map(|y| y.to_string()));
    let path = data_path(data_dir, HOUSE_CHANGES_FILE);
    write_csv(
        &path,
        &header,
        rows.into_iter().map(|(key, parties)| {
            let mut row = vec![key.padded()];
            row.extend(parties);
            row
        }),
    )
}

/// Joins all the house cycles. Missing inputs are reported: without results
/// the census districts of a cycle get zero votes, without census the cycle
/// is not joined.
pub fn join_house_data(data_dir: &Path) -> PrepResult<()> {
    let house_path = data_path(data_dir, HOUSE_RESULTS_FILE);
    let house_rows = if house_path.exists() {
        read_house_results(&house_path)?
    } else {
        warn!(
            "join_house_data: {} is missing, no historical votes",
            path_str(&house_path)
        );
        Vec::new()
    };
    let scraped_path = data_path(data_dir, SCRAPED_RESULTS_FILE);
    let scraped = if scraped_path.exists() {
        Some(read_scraped_results(&scraped_path)?)
    } else {
        warn!(
            "join_house_data: {} is missing, the current cycle is skipped",
            path_str(&scraped_path)
        );
        None
    };

    let mut history = VoteHistory::new();
    let mut features: Vec<FeatureRow> = Vec::new();
    for cycle in HOUSE_CYCLES.iter() {
        let results = match (cycle.results, &scraped) {
            (ResultsSource::HouseHistory, _) => CycleResults::HouseHistory(
                house_rows
                    .iter()
                    .filter(|r| r.year == cycle.year)
                    .cloned()
                    .collect(),
            ),
            (ResultsSource::Scraped, Some(rows)) => CycleResults::Scraped(rows.clone()),
            (ResultsSource::Scraped, None) => continue,
        };
        let census = match cycle.census_year {
            Some(year) => {
                let c = read_census_table(data_dir, year)?;
                if c.is_none() {
                    warn!(
                        "join_house_data: {} is missing",
                        parsed_census_file(year)
                    );
                }
                c
            }
            None => None,
        };
        let exit_poll = match cycle.exit_poll {
            Some(key) => read_parsed_exit_poll(data_dir, key)?,
            None => None,
        };
        let inputs = CycleInputs {
            results,
            census,
            exit_poll,
        };
        let (table, h) = run_cycle(cycle, inputs, history).context(DistrictSnafu {})?;
        history = h;
        if let Some(table) = table {
            check_schema(&table)?;
            let n = write_joined_table(data_dir, &table)?;
            info!("join_house_data: {} rows for {}", n, cycle.year);
            features.extend(normalize_table(&table));
        }
    }

    let n = write_csv(
        &data_path(data_dir, FEATURES_FILE),
        &FeatureRow::header(),
        features.iter().map(|f| f.to_record()),
    )?;
    info!("join_house_data: {} rows in {}", n, FEATURES_FILE);
    write_party_changes(data_dir, &history)?;
    Ok(())
}

pub fn join_pres_data() {
    warn!("join_pres_data: not implemented yet, skipping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use district_features::{CensusRecord, DistrictKey, PollBuckets};
    use std::collections::BTreeMap;

    fn table(fields: &[&str]) -> JoinedTable {
        JoinedTable {
            year: 2020,
            census_fields: fields.iter().map(|s| s.to_string()).collect(),
            poll_columns: vec![],
            buckets: PollBuckets::Final,
            rows: vec![],
        }
    }

    #[test]
    fn schema_check() {
        let all: Vec<&str> = district_features::census_fields(2019)
            .unwrap()
            .iter()
            .map(|(_, n)| *n)
            .collect();
        assert!(check_schema(&table(&all)).is_ok());
        let partial: Vec<&str> = all.iter().filter(|n| **n != "age_21_plus").cloned().collect();
        assert!(check_schema(&table(&partial)).is_err());
    }

    // A parsed census table of the year with every field set to 100.
    fn write_census(dir: &Path, year: u32, key: &DistrictKey) {
        let fields = district_features::census_fields(year).unwrap();
        let mut record = CensusRecord::new(key.clone());
        for (_, name) in fields.iter() {
            record.fields.insert(name.to_string(), 100.0);
        }
        let mut records = BTreeMap::new();
        records.insert(key.clone(), record);
        let census = district_features::CensusTable {
            year,
            field_names: fields.iter().map(|(_, n)| n.to_string()).collect(),
            records,
        };
        crate::pipeline::io_census::write_census_table(dir, &census).unwrap();
    }

    #[test]
    fn missing_house_results_gives_zero_votes() {
        let dir = tempfile::tempdir().unwrap();
        write_census(dir.path(), 2012, &DistrictKey::new("VT", 1));

        join_house_data(dir.path()).unwrap();
        let lines = read_raw_records(&dir.path().join("final_data_2012h.csv")).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(&lines[1][0..8], &["2012", "VT", "1", "0", "0", "0", "0", ""]);
        let features = read_raw_records(&dir.path().join(FEATURES_FILE)).unwrap();
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn joined_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let key = DistrictKey::new("VT", 1);
        let mut census = CensusRecord::new(key.clone());
        census.fields.insert("age_pop".to_string(), 620000.0);
        let mut deltas = BTreeMap::new();
        deltas.insert("Gender_Male".to_string(), -3);
        let t = JoinedTable {
            year: 2016,
            census_fields: vec!["age_pop".to_string()],
            poll_columns: vec!["Gender_Male".to_string(), "Gender_Female".to_string()],
            buckets: PollBuckets::Narrow,
            rows: vec![district_features::JoinedRow {
                year: 2016,
                key: key.clone(),
                votes: district_features::VoteRecord::empty(key),
                prev_party: "d".to_string(),
                census,
                poll_deltas: deltas,
            }],
        };
        write_joined_table(dir.path(), &t).unwrap();
        let lines = read_raw_records(&dir.path().join("final_data_2016h.csv")).unwrap();
        assert_eq!(
            lines[0],
            vec![
                "year",
                "state",
                "district",
                "dem",
                "rep",
                "tot",
                "incumbent",
                "prevparty",
                "age_pop",
                "Gender_Male",
                "Gender_Female"
            ]
        );
        assert_eq!(
            lines[1],
            vec!["2016", "VT", "1", "0", "0", "0", "0", "d", "620000", "-3", ""]
        );
    }

    #[test]
    fn current_cycle_uses_scraped_results() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        write_census(d, 2019, &DistrictKey::new("MA", 1));
        std::fs::write(
            d.join(HOUSE_RESULTS_FILE),
            "year,state_po,district,stage,candidate,party,candidatevotes,totalvotes\n\
             2018,MA,1,gen,Richard Neal,democrat,211790,216000\n",
        )
        .unwrap();
        std::fs::write(
            d.join(SCRAPED_RESULTS_FILE),
            "district-name,district,dem-candidate,gop-candidate,dem-num,gop-num,dem-pct,gop-pct\n\
             Massachusetts's 1st district,MA-01,Richard Neal*,,\"275,376\",,96.5,\n",
        )
        .unwrap();
        std::fs::write(
            d.join("parsed_exitpolls_2020h.csv"),
            "question,answer,dem,rep,other\n\
             Age,18-34,60,38,2\n\
             Gender,Male,45,53,2\n",
        )
        .unwrap();

        join_house_data(d).unwrap();
        let joined = read_raw_records(&d.join("final_data_2020h.csv")).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(
            &joined[1][0..8],
            &["2020", "MA", "1", "275376", "0", "275376", "1", "d"]
        );
        let age = joined[0].iter().position(|c| c == "Age_18-34").unwrap();
        assert_eq!(joined[1][age], "22");

        let features = read_raw_records(&d.join(FEATURES_FILE)).unwrap();
        let col = |name: &str| features[0].iter().position(|c| c == name).unwrap();
        assert_eq!(features[1][col("poll_age_18_34")], "22");
        assert_eq!(features[1][col("poll_gender_male")], "-8");
        assert_eq!(features[1][col("poll_age_35_49")], "");

        let changes = read_raw_records(&d.join(HOUSE_CHANGES_FILE)).unwrap();
        assert_eq!(changes[0], vec!["district", "2020", "2018"]);
        assert_eq!(changes[1], vec!["MA-01", "D", "D"]);
    }
}
