// Census tables: the raw group files of the census API, and the parsed table
// of each year.

use std::collections::BTreeMap;
use std::path::Path;

use district_features::builder::CensusBuilder;
use district_features::{CensusRecord, CensusTable, DistrictKey, CENSUS_GROUPS};

use crate::pipeline::io_common::*;
use crate::pipeline::*;

/// Builds the table of a year from its group files. Missing group files are
/// reported and the others are used.
pub fn read_census_groups(data_dir: &Path, year: u32) -> PrepResult<CensusTable> {
    let mut builder = CensusBuilder::new(year).context(DistrictSnafu {})?;
    for group in CENSUS_GROUPS.iter() {
        let path = data_path(data_dir, &census_group_file(year, group));
        if !path.exists() {
            warn!("read_census_groups: {} is missing", path_str(&path));
            continue;
        }
        let lines = read_raw_records(&path)?;
        debug!(
            "read_census_groups: {} lines in {}",
            lines.len(),
            path_str(&path)
        );
        for line in lines.iter() {
            builder.add_row(line).context(DistrictSnafu {})?;
        }
    }
    Ok(builder.build())
}

pub fn census_header(table: &CensusTable) -> Vec<String> {
    let mut h: Vec<String> = vec![
        "year".to_string(),
        "state".to_string(),
        "district".to_string(),
    ];
    h.extend(table.field_names.iter().cloned());
    h
}

pub fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

pub fn write_census_table(data_dir: &Path, table: &CensusTable) -> PrepResult<usize> {
    let path = data_path(data_dir, &parsed_census_file(table.year));
    let rows = table.records.values().map(|r| {
        let mut row = vec![
            table.year.to_string(),
            r.key.state.clone(),
            r.key.district.to_string(),
        ];
        row.extend(table.field_names.iter().map(|f| format_value(r.get(f))));
        row
    });
    write_csv(&path, &census_header(table), rows)
}

/// Parses all the census years that have a field table.
pub fn parse_all_census(data_dir: &Path) -> PrepResult<()> {
    for year in district_features::CENSUS_PARSE_YEARS.iter() {
        let table = read_census_groups(data_dir, *year)?;
        if table.records.is_empty() {
            warn!("parse_all_census: no census data for {}", year);
            continue;
        }
        let n = write_census_table(data_dir, &table)?;
        info!("parse_all_census: {} districts for {}", n, year);
    }
    Ok(())
}

/// Reads a parsed census table. `None` when the file is not there.
pub fn read_census_table(data_dir: &Path, year: u32) -> PrepResult<Option<CensusTable>> {
    let path = data_path(data_dir, &parsed_census_file(year));
    if !path.exists() {
        return Ok(None);
    }
    let lines = read_raw_records(&path)?;
    let mut it = lines.into_iter();
    let header = match it.next() {
        Some(h) => h,
        None => whatever!("Empty census file {}", path_str(&path)),
    };
    let field_names: Vec<String> = header.iter().skip(3).cloned().collect();
    let mut records: BTreeMap<DistrictKey, CensusRecord> = BTreeMap::new();
    for (idx, line) in it.enumerate() {
        if line.len() < 3 {
            warn!("read_census_table: short line {} in {}", idx + 2, path_str(&path));
            continue;
        }
        let district = match line[2].parse::<u32>() {
            Ok(d) => d,
            Err(_) => {
                warn!("read_census_table: invalid district {:?}", line[2]);
                continue;
            }
        };
        let key = DistrictKey::new(&line[1], district);
        let mut record = CensusRecord::new(key.clone());
        for (name, raw) in field_names.iter().zip(line.iter().skip(3)) {
            let v = raw.parse::<f64>().unwrap_or_else(|_| {
                warn!("read_census_table: non-numeric {} for {}: {:?}", name, key, raw);
                0.0
            });
            record.fields.insert(name.clone(), v);
        }
        records.insert(key, record);
    }
    Ok(Some(CensusTable {
        year,
        field_names,
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn group_files_to_parsed_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("census-by-congress_2019DP05.csv"),
            "NAME,DP05_0001E,DP05_0087E,state,congressional district\n\
             \"Congressional District 1 (116th Congress), Maine\",682000,540000,23,01\n\
             \"Congressional District 2 (116th Congress), Maine\",660000,520000,23,02\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("census-by-congress_2019DP02.csv"),
            "NAME,DP02_0059E\n\
             \"Congressional District (at Large) (116th Congress), Vermont\",440000\n",
        )
        .unwrap();
        let table = read_census_groups(dir.path(), 2019).unwrap();
        assert_eq!(table.records.len(), 3);

        write_census_table(dir.path(), &table).unwrap();
        let back = read_census_table(dir.path(), 2019).unwrap().unwrap();
        assert_eq!(back.field_names, table.field_names);
        let me1 = &back.records[&DistrictKey::new("ME", 1)];
        assert_eq!(me1.get("age_pop"), 682000.0);
        assert_eq!(me1.get("voteage_pop"), 540000.0);
        assert_eq!(me1.get("ed_pop"), 0.0);
        let lines =
            read_raw_records(&dir.path().join("parsed_census-by-congress_2019.csv")).unwrap();
        assert_eq!(&lines[0][0..4], &["year", "state", "district", "voteage_pop"]);
        assert_eq!(&lines[1][0..4], &["2019", "ME", "1", "540000"]);
    }

    #[test]
    fn unknown_state_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("census-by-congress_2018DP05.csv"),
            "NAME,DP05_0001E\n\"Congressional District 1 (115th Congress), Atlantis\",1\n",
        )
        .unwrap();
        assert!(read_census_groups(dir.path(), 2018).is_err());
    }

    #[test]
    fn missing_parsed_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_census_table(dir.path(), 2016).unwrap().is_none());
    }
}
