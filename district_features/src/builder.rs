pub use crate::config::*;
use crate::district::{parse_census_label, DistrictError, DistrictKey};

use log::{debug, error, warn};
use std::collections::{BTreeMap, HashMap};

/// A builder for the census table of one year.
///
/// The census API serves one file per variable group. Each group file is added
/// in turn; the record of a district is the union of the fields found in all
/// the groups.
///
/// ```
/// use district_features::builder::CensusBuilder;
/// # use district_features::DistrictError;
///
/// let mut builder = CensusBuilder::new(2019)?;
/// let header = vec!["NAME".to_string(), "DP05_0001E".to_string()];
/// builder.add_header(&header);
/// builder.add_row(&[
///     "Congressional District 1 (116th Congress), Maine".to_string(),
///     "682000".to_string(),
/// ])?;
/// let table = builder.build();
/// assert_eq!(table.records.len(), 1);
///
/// # Ok::<(), DistrictError>(())
/// ```
pub struct CensusBuilder {
    pub(crate) _year: u32,
    pub(crate) _fields: &'static [(&'static str, &'static str)],
    // field name -> column index, for the group file being read
    pub(crate) _columns: HashMap<&'static str, usize>,
    pub(crate) _records: BTreeMap<DistrictKey, CensusRecord>,
}

impl CensusBuilder {
    /// Fails when the year has no field table.
    pub fn new(year: u32) -> Result<CensusBuilder, DistrictError> {
        let fields = census_fields(year).ok_or(DistrictError::UnknownCensusYear { year })?;
        Ok(CensusBuilder {
            _year: year,
            _fields: fields,
            _columns: HashMap::new(),
            _records: BTreeMap::new(),
        })
    }

    /// Starts a new group file: maps the known codes of its header to column
    /// indexes. Codes of other years or other groups are ignored.
    pub fn add_header(&mut self, header: &[String]) {
        self._columns.clear();
        for (idx, code) in header.iter().enumerate() {
            if let Some((_, name)) = self._fields.iter().find(|(c, _)| *c == code.as_str()) {
                self._columns.insert(*name, idx);
            }
        }
        debug!(
            "add_header: year {}: found {} mapped columns",
            self._year,
            self._columns.len()
        );
    }

    /// Adds a row of the current group file. The header row itself (`NAME` in
    /// the first column) may be passed here too.
    ///
    /// Only an unknown state name is returned as an error. Labels that cannot
    /// be parsed are logged and the row is dropped.
    pub fn add_row(&mut self, row: &[String]) -> Result<(), DistrictError> {
        let label = match row.first() {
            Some(l) if l == "NAME" => {
                self.add_header(row);
                return Ok(());
            }
            Some(l) => l,
            None => return Ok(()),
        };
        let key = match parse_census_label(label) {
            Ok(k) => k,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("add_row: year {}: {}", self._year, e);
                return Ok(());
            }
        };
        let record = self
            ._records
            .entry(key.clone())
            .or_insert_with(|| CensusRecord::new(key.clone()));
        for (name, idx) in self._columns.iter() {
            let raw = match row.get(*idx) {
                Some(r) => r,
                None => continue,
            };
            let value = match raw.trim().parse::<f64>() {
                Ok(v) => v,
                Err(_) => {
                    warn!(
                        "add_row: non-numeric value {:?} for {} of {}, {}",
                        raw, name, key, self._year
                    );
                    0.0
                }
            };
            record.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// The table with all the districts seen so far. Fields that no group file
    /// provided for a district are set to 0.
    pub fn build(self) -> CensusTable {
        let field_names: Vec<String> = self._fields.iter().map(|(_, n)| n.to_string()).collect();
        let mut records = self._records;
        for (key, record) in records.iter_mut() {
            for name in field_names.iter() {
                if !record.has(name) {
                    warn!("Missing {} for {},{}", name, key, self._year);
                    record.fields.insert(name.clone(), 0.0);
                }
            }
        }
        CensusTable {
            year: self._year,
            field_names,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn districts_are_the_union_of_group_files() {
        let mut b = CensusBuilder::new(2019).unwrap();
        b.add_row(&strings(&["NAME", "DP05_0001E", "DP05_0009E", "state"]))
            .unwrap();
        b.add_row(&strings(&[
            "Congressional District 1 (116th Congress), Maine",
            "600",
            "40",
            "23",
        ]))
        .unwrap();
        b.add_row(&strings(&[
            "Congressional District 2 (116th Congress), Maine",
            "700",
            "50",
            "23",
        ]))
        .unwrap();
        b.add_row(&strings(&["NAME", "DP02_0059E", "DP02_0065E"]))
            .unwrap();
        b.add_row(&strings(&[
            "Congressional District 2 (116th Congress), Maine",
            "500",
            "90",
        ]))
        .unwrap();
        b.add_row(&strings(&[
            "Congressional District (at Large) (116th Congress), Vermont",
            "400",
            "80",
        ]))
        .unwrap();
        let t = b.build();
        let keys: Vec<String> = t.records.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["ME-1", "ME-2", "VT-1"]);

        let me2 = &t.records[&DistrictKey::new("ME", 2)];
        assert_eq!(me2.get("age_pop"), 700.0);
        assert_eq!(me2.get("ed_pop"), 500.0);
        assert_eq!(me2.get("ed_ba"), 90.0);
        // Not in any group file: defaults to zero but is present.
        assert!(me2.has("inc_200_plus"));
        assert_eq!(me2.get("inc_200_plus"), 0.0);

        let vt = &t.records[&DistrictKey::new("VT", 1)];
        assert_eq!(vt.get("age_pop"), 0.0);
        assert_eq!(t.field_names.len(), 32);
    }

    #[test]
    fn unknown_state_stops_the_build() {
        let mut b = CensusBuilder::new(2018).unwrap();
        b.add_header(&strings(&["NAME", "DP05_0001E"]));
        let res = b.add_row(&strings(&["Congressional District 1 (116th Congress), Gondor", "1"]));
        assert!(res.is_err());
    }

    #[test]
    fn years_without_table_are_rejected() {
        assert_eq!(
            CensusBuilder::new(2015).err(),
            Some(DistrictError::UnknownCensusYear { year: 2015 })
        );
        assert!(CensusBuilder::new(2012).is_ok());
    }
}
