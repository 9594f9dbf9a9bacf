//! The column normalizer: one fixed feature schema for every cycle.
//!
//! The census brackets and the exit-poll buckets do not line up from one year
//! (or one source) to the next. Census counts are re-bucketed directly. The
//! exit-poll deltas of the older cycles are aggregated into the final buckets
//! with the census sub-populations of each district as weights.

use log::debug;

use crate::config::*;
use crate::district::DistrictKey;

// Ages 18 and 19 out of the three single years 18 to 20 (`age_18_plus - age_21_plus`).
const AGE_18_19_SHARE: f64 = 2.0 / 3.0;
// The 45-54 bracket is split evenly: 45-49 and 50-54.
const AGE_45_49_SHARE: f64 = 0.5;
// The 25-34 bracket, split for the 18-29 and 30-39 poll buckets.
const AGE_25_29_SHARE: f64 = 0.5;
// The 35-44 bracket, split for the 30-39 and 40-49 poll buckets.
const AGE_35_39_SHARE: f64 = 0.5;

/// A census feature column and the field sets it can be derived from, in
/// order of preference.
pub struct CensusFeature {
    pub name: &'static str,
    pub sources: &'static [&'static [&'static str]],
}

pub const CENSUS_FEATURES: &[CensusFeature] = &[
    CensusFeature {
        name: "pop",
        sources: &[&["age_pop"]],
    },
    CensusFeature {
        name: "vote_age_pop",
        sources: &[&["voteage_pop"], &["age_18_plus", "allage_citzenpct"]],
    },
    CensusFeature {
        name: "male",
        sources: &[
            &["voteage_m"],
            &["allage_m", "age_pop", "age_18_plus", "allage_citzenpct"],
        ],
    },
    CensusFeature {
        name: "female",
        sources: &[
            &["voteage_f"],
            &["allage_f", "age_pop", "age_18_plus", "allage_citzenpct"],
        ],
    },
    CensusFeature {
        name: "race_white",
        sources: &[&["race_white"]],
    },
    CensusFeature {
        name: "race_nonwhite",
        sources: &[&["race_pop", "race_white"]],
    },
    CensusFeature {
        name: "ed_nodegree",
        sources: &[&["ed_pop", "ed_ba", "ed_grdeg"]],
    },
    CensusFeature {
        name: "ed_4yr",
        sources: &[&["ed_ba", "ed_grdeg"]],
    },
    CensusFeature {
        name: "inc_0_50",
        sources: &[&[
            "inc_less_10",
            "inc_10_14",
            "inc_15_24",
            "inc_25_34",
            "inc_35_49",
        ]],
    },
    CensusFeature {
        name: "inc_50_100",
        sources: &[&["inc_50_74", "inc_75_99"]],
    },
    CensusFeature {
        name: "inc_100_plus",
        sources: &[&["inc_100_149", "inc_150_199", "inc_200_plus"]],
    },
    CensusFeature {
        name: "age_18_34",
        sources: &[&["age_20_24", "age_25_34", "age_18_plus", "age_21_plus"]],
    },
    CensusFeature {
        name: "age_35_49",
        sources: &[&["age_35_44", "age_45_54"]],
    },
    CensusFeature {
        name: "age_50_64",
        sources: &[&["age_45_54", "age_55_59", "age_60_64"]],
    },
    CensusFeature {
        name: "age_65_plus",
        sources: &[&["age_65_plus"]],
    },
];

/// The census sub-population behind a narrow exit-poll bucket.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SubPopulation {
    Male,
    Female,
    Age18To29,
    Age30To34,
    Age35To39,
    Age40To49,
    Age50To64,
    Age65Plus,
    IncomeUnder50,
    Income50To100,
    Income100Plus,
    White,
    Black,
    Hispanic,
    Asian,
    OtherRace,
    NoDegree,
    Bachelors,
    Graduate,
}

/// An exit-poll feature column.
///
/// `final_column` is read as is for cycles in final buckets. `narrow` lists the
/// narrow buckets averaged together for the older cycles.
pub struct PollFeature {
    pub name: &'static str,
    pub final_column: &'static str,
    pub narrow: &'static [(&'static str, SubPopulation)],
}

pub const POLL_FEATURES: &[PollFeature] = &[
    PollFeature {
        name: "poll_gender_male",
        final_column: "Gender_Male",
        narrow: &[("Gender_Male", SubPopulation::Male)],
    },
    PollFeature {
        name: "poll_gender_female",
        final_column: "Gender_Female",
        narrow: &[("Gender_Female", SubPopulation::Female)],
    },
    PollFeature {
        name: "poll_age_18_34",
        final_column: "Age_18-34",
        narrow: &[
            ("Age_18-29", SubPopulation::Age18To29),
            ("Age_30-39", SubPopulation::Age30To34),
        ],
    },
    PollFeature {
        name: "poll_age_35_49",
        final_column: "Age_35-49",
        narrow: &[
            ("Age_30-39", SubPopulation::Age35To39),
            ("Age_40-49", SubPopulation::Age40To49),
        ],
    },
    PollFeature {
        name: "poll_age_50_64",
        final_column: "Age_50-64",
        narrow: &[("Age_50-64", SubPopulation::Age50To64)],
    },
    PollFeature {
        name: "poll_age_65_plus",
        final_column: "Age_65 and Older",
        narrow: &[("Age_65 and Older", SubPopulation::Age65Plus)],
    },
    PollFeature {
        name: "poll_inc_0_50",
        final_column: "Income_Less Than $50K",
        narrow: &[("Income_Less Than $50K", SubPopulation::IncomeUnder50)],
    },
    PollFeature {
        name: "poll_inc_50_100",
        final_column: "Income_$50-100K",
        narrow: &[("Income_$50-100K", SubPopulation::Income50To100)],
    },
    PollFeature {
        name: "poll_inc_100_plus",
        final_column: "Income_$100K or More",
        narrow: &[("Income_$100K or More", SubPopulation::Income100Plus)],
    },
    PollFeature {
        name: "poll_race_white",
        final_column: "Race_White",
        narrow: &[("Race_White", SubPopulation::White)],
    },
    PollFeature {
        name: "poll_race_nonwhite",
        final_column: "Race_Nonwhite",
        narrow: &[
            ("Race_Black", SubPopulation::Black),
            ("Race_Latino", SubPopulation::Hispanic),
            ("Race_Asian", SubPopulation::Asian),
            ("Race_Other", SubPopulation::OtherRace),
        ],
    },
    PollFeature {
        name: "poll_ed_nodegree",
        final_column: "Education_No degree",
        narrow: &[("Education_HS or less", SubPopulation::NoDegree)],
    },
    PollFeature {
        name: "poll_ed_4yr",
        final_column: "Education_4 yr degree",
        narrow: &[
            ("Education_College Graduate", SubPopulation::Bachelors),
            ("Education_Postgraduate", SubPopulation::Graduate),
        ],
    },
];

/// The census features of one district, before rounding.
#[derive(PartialEq, Debug, Clone)]
pub struct CensusFeatures {
    pub pop: f64,
    pub vote_age_pop: f64,
    pub male: f64,
    pub female: f64,
    pub race_white: f64,
    pub race_nonwhite: f64,
    pub ed_nodegree: f64,
    pub ed_4yr: f64,
    pub inc_0_50: f64,
    pub inc_50_100: f64,
    pub inc_100_plus: f64,
    pub age_18_34: f64,
    pub age_35_49: f64,
    pub age_50_64: f64,
    pub age_65_plus: f64,
    // Finer pieces, only used as poll weights.
    age_18_19: f64,
}

impl CensusFeatures {
    pub fn derive(r: &CensusRecord) -> CensusFeatures {
        let pop = r.get("age_pop");
        let vote_age_pop = if r.has("voteage_pop") {
            r.get("voteage_pop")
        } else {
            r.get("age_18_plus") * r.get("allage_citzenpct") / 100.0
        };
        // Before 2016 only the all-ages split is known: scale it down to the
        // citizen voting-age population.
        let adult_share = if pop > 0.0 { vote_age_pop / pop } else { 0.0 };
        let male = if r.has("voteage_m") {
            r.get("voteage_m")
        } else {
            r.get("allage_m") * adult_share
        };
        let female = if r.has("voteage_f") {
            r.get("voteage_f")
        } else {
            r.get("allage_f") * adult_share
        };
        let ed_4yr = r.get("ed_ba") + r.get("ed_grdeg");
        // Some sources swap the two adult totals: only the gap is meaningful.
        let age_18_20 = (r.get("age_18_plus") - r.get("age_21_plus")).abs();
        let age_18_19 = AGE_18_19_SHARE * age_18_20;
        CensusFeatures {
            pop,
            vote_age_pop,
            male,
            female,
            race_white: r.get("race_white"),
            race_nonwhite: r.get("race_pop") - r.get("race_white"),
            ed_nodegree: r.get("ed_pop") - ed_4yr,
            ed_4yr,
            inc_0_50: r.get("inc_less_10")
                + r.get("inc_10_14")
                + r.get("inc_15_24")
                + r.get("inc_25_34")
                + r.get("inc_35_49"),
            inc_50_100: r.get("inc_50_74") + r.get("inc_75_99"),
            inc_100_plus: r.get("inc_100_149") + r.get("inc_150_199") + r.get("inc_200_plus"),
            age_18_34: age_18_19 + r.get("age_20_24") + r.get("age_25_34"),
            age_35_49: r.get("age_35_44") + AGE_45_49_SHARE * r.get("age_45_54"),
            age_50_64: (1.0 - AGE_45_49_SHARE) * r.get("age_45_54")
                + r.get("age_55_59")
                + r.get("age_60_64"),
            age_65_plus: r.get("age_65_plus"),
            age_18_19,
        }
    }

    /// The features in [CENSUS_FEATURES] order.
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("pop", self.pop),
            ("vote_age_pop", self.vote_age_pop),
            ("male", self.male),
            ("female", self.female),
            ("race_white", self.race_white),
            ("race_nonwhite", self.race_nonwhite),
            ("ed_nodegree", self.ed_nodegree),
            ("ed_4yr", self.ed_4yr),
            ("inc_0_50", self.inc_0_50),
            ("inc_50_100", self.inc_50_100),
            ("inc_100_plus", self.inc_100_plus),
            ("age_18_34", self.age_18_34),
            ("age_35_49", self.age_35_49),
            ("age_50_64", self.age_50_64),
            ("age_65_plus", self.age_65_plus),
        ]
    }

    /// A feature rounded to the nearest integer.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.round() as i64)
    }

    fn sub_population(&self, sp: SubPopulation, r: &CensusRecord) -> f64 {
        match sp {
            SubPopulation::Male => self.male,
            SubPopulation::Female => self.female,
            SubPopulation::Age18To29 => {
                self.age_18_19 + r.get("age_20_24") + AGE_25_29_SHARE * r.get("age_25_34")
            }
            SubPopulation::Age30To34 => (1.0 - AGE_25_29_SHARE) * r.get("age_25_34"),
            SubPopulation::Age35To39 => AGE_35_39_SHARE * r.get("age_35_44"),
            SubPopulation::Age40To49 => {
                (1.0 - AGE_35_39_SHARE) * r.get("age_35_44") + AGE_45_49_SHARE * r.get("age_45_54")
            }
            SubPopulation::Age50To64 => self.age_50_64,
            SubPopulation::Age65Plus => self.age_65_plus,
            SubPopulation::IncomeUnder50 => self.inc_0_50,
            SubPopulation::Income50To100 => self.inc_50_100,
            SubPopulation::Income100Plus => self.inc_100_plus,
            SubPopulation::White => self.race_white,
            SubPopulation::Black => r.get("race_black"),
            SubPopulation::Hispanic => r.get("race_hisp"),
            SubPopulation::Asian => r.get("race_asian"),
            SubPopulation::OtherRace => (self.race_nonwhite
                - r.get("race_black")
                - r.get("race_hisp")
                - r.get("race_asian"))
            .max(0.0),
            SubPopulation::NoDegree => self.ed_nodegree,
            SubPopulation::Bachelors => r.get("ed_ba"),
            SubPopulation::Graduate => r.get("ed_grdeg"),
        }
    }
}

/// Population-weighted average of poll percentages, rounded.
///
/// Each part is (census sub-population, poll value). Parts without a poll
/// value are left out and the weights of the others renormalized.
pub fn weighted_percentage(parts: &[(f64, Option<i64>)]) -> Option<i64> {
    let present: Vec<(f64, i64)> = parts
        .iter()
        .filter_map(|(w, p)| p.map(|p| (*w, p)))
        .collect();
    let total: f64 = present.iter().map(|(w, _)| w).sum();
    if present.is_empty() || total <= 0.0 {
        return None;
    }
    let avg: f64 = present
        .iter()
        .map(|(w, p)| (w / total) * (*p as f64))
        .sum();
    Some(avg.round() as i64)
}

/// One row of the final feature file.
#[derive(PartialEq, Debug, Clone)]
pub struct FeatureRow {
    pub year: u32,
    pub key: DistrictKey,
    pub dem: u64,
    pub rep: u64,
    pub total: u64,
    pub incumbent: bool,
    pub prev_party: String,
    /// In [CENSUS_FEATURES] order.
    pub census: Vec<i64>,
    /// In [POLL_FEATURES] order. `None` when the poll has no data for it.
    pub polls: Vec<Option<i64>>,
}

impl FeatureRow {
    pub fn header() -> Vec<String> {
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
        h.extend(CENSUS_FEATURES.iter().map(|f| f.name.to_string()));
        h.extend(POLL_FEATURES.iter().map(|f| f.name.to_string()));
        h
    }

    pub fn to_record(&self) -> Vec<String> {
        let mut r: Vec<String> = vec![
            self.year.to_string(),
            self.key.state.clone(),
            self.key.district.to_string(),
            self.dem.to_string(),
            self.rep.to_string(),
            self.total.to_string(),
            (self.incumbent as u8).to_string(),
            self.prev_party.clone(),
        ];
        r.extend(self.census.iter().map(|v| v.to_string()));
        r.extend(
            self.polls
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        r
    }
}

/// The final feature columns that a census field list can produce. The list
/// is complete when it equals [FeatureRow::header].
pub fn derivable_columns(field_names: &[String]) -> Vec<String> {
    let has = |f: &&str| field_names.iter().any(|n| n == f);
    let mut res: Vec<String> = FeatureRow::header()
        .into_iter()
        .take(8)
        .collect();
    for feature in CENSUS_FEATURES.iter() {
        if feature.sources.iter().any(|set| set.iter().all(has)) {
            res.push(feature.name.to_string());
        }
    }
    res.extend(POLL_FEATURES.iter().map(|f| f.name.to_string()));
    res
}

fn poll_features(
    row: &JoinedRow,
    census: &CensusFeatures,
    buckets: PollBuckets,
) -> Vec<Option<i64>> {
    POLL_FEATURES
        .iter()
        .map(|f| match buckets {
            PollBuckets::Final => row.poll_deltas.get(f.final_column).copied(),
            PollBuckets::Narrow => {
                let parts: Vec<(f64, Option<i64>)> = f
                    .narrow
                    .iter()
                    .map(|(col, sp)| {
                        (
                            census.sub_population(*sp, &row.census),
                            row.poll_deltas.get(*col).copied(),
                        )
                    })
                    .collect();
                weighted_percentage(&parts)
            }
        })
        .collect()
}

/// Normalizes one joined cycle into the final schema.
pub fn normalize_table(table: &JoinedTable) -> Vec<FeatureRow> {
    debug!(
        "normalize_table: {} rows for {} ({:?} buckets)",
        table.rows.len(),
        table.year,
        table.buckets
    );
    table
        .rows
        .iter()
        .map(|row| {
            let census = CensusFeatures::derive(&row.census);
            let polls = poll_features(row, &census, table.buckets);
            FeatureRow {
                year: row.year,
                key: row.key.clone(),
                dem: row.votes.dem,
                rep: row.votes.rep,
                total: row.votes.total,
                incumbent: row.votes.incumbent,
                prev_party: row.prev_party.clone(),
                census: census.values().iter().map(|(_, v)| v.round() as i64).collect(),
                polls,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(fields: &[(&str, f64)]) -> CensusRecord {
        let mut r = CensusRecord::new(DistrictKey::new("MA", 3));
        for (k, v) in fields {
            r.fields.insert(k.to_string(), *v);
        }
        r
    }

    #[test]
    fn income_rebucketing() {
        let f = CensusFeatures::derive(&record(&[("inc_50_74", 100.0), ("inc_75_99", 50.0)]));
        assert_eq!(f.get("inc_50_100"), Some(150));
        assert_eq!(f.get("inc_0_50"), Some(0));
    }

    #[test]
    fn age_rebucketing() {
        let f = CensusFeatures::derive(&record(&[
            ("age_20_24", 40.0),
            ("age_25_34", 60.0),
            ("age_21_plus", 500.0),
            ("age_18_plus", 470.0),
        ]));
        assert_eq!(f.get("age_18_34"), Some(120));

        let f = CensusFeatures::derive(&record(&[
            ("age_35_44", 100.0),
            ("age_45_54", 80.0),
            ("age_55_59", 30.0),
            ("age_60_64", 20.0),
        ]));
        assert_eq!(f.get("age_35_49"), Some(140));
        assert_eq!(f.get("age_50_64"), Some(90));
    }

    #[test]
    fn direct_recomputation() {
        let f = CensusFeatures::derive(&record(&[
            ("race_pop", 1000.0),
            ("race_white", 700.0),
            ("ed_pop", 600.0),
            ("ed_ba", 150.0),
            ("ed_grdeg", 90.0),
        ]));
        assert_eq!(f.get("race_nonwhite"), Some(300));
        assert_eq!(f.get("ed_4yr"), Some(240));
        assert_eq!(f.get("ed_nodegree"), Some(360));
        assert_eq!(f.get("no_such_feature"), None);
    }

    #[test]
    fn voting_age_estimated_without_citizen_block() {
        let f = CensusFeatures::derive(&record(&[
            ("age_pop", 1000.0),
            ("allage_m", 480.0),
            ("allage_f", 520.0),
            ("age_18_plus", 800.0),
            ("allage_citzenpct", 90.0),
        ]));
        assert_eq!(f.get("vote_age_pop"), Some(720));
        assert_eq!(f.get("male"), Some(346));
        assert_eq!(f.get("female"), Some(374));
    }

    #[test]
    fn weighted_average() {
        assert_eq!(
            weighted_percentage(&[(100.0, Some(10)), (300.0, Some(-10))]),
            Some(-5)
        );
        // A missing bucket is left out.
        assert_eq!(weighted_percentage(&[(100.0, Some(10)), (300.0, None)]), Some(10));
        assert_eq!(weighted_percentage(&[(0.0, Some(10))]), None);
        assert_eq!(weighted_percentage(&[(10.0, None)]), None);
    }

    #[test]
    fn narrow_polls_are_weighted_by_district() {
        let census = record(&[
            ("race_pop", 1000.0),
            ("race_white", 600.0),
            ("race_black", 300.0),
            ("race_hisp", 100.0),
            ("race_asian", 0.0),
            ("ed_ba", 100.0),
            ("ed_grdeg", 300.0),
        ]);
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        deltas.insert("Race_White".to_string(), -20);
        deltas.insert("Race_Black".to_string(), 80);
        deltas.insert("Race_Latino".to_string(), 40);
        deltas.insert("Education_College Graduate".to_string(), 10);
        deltas.insert("Education_Postgraduate".to_string(), 30);
        let table = JoinedTable {
            year: 2018,
            census_fields: vec![],
            poll_columns: vec![],
            buckets: PollBuckets::Narrow,
            rows: vec![JoinedRow {
                year: 2018,
                key: census.key.clone(),
                votes: VoteRecord::empty(census.key.clone()),
                prev_party: String::new(),
                census,
                poll_deltas: deltas,
            }],
        };
        let rows = normalize_table(&table);
        let idx = |name: &str| POLL_FEATURES.iter().position(|f| f.name == name).unwrap();
        let polls = &rows[0].polls;
        assert_eq!(polls[idx("poll_race_white")], Some(-20));
        // (300 * 80 + 100 * 40) / 400
        assert_eq!(polls[idx("poll_race_nonwhite")], Some(70));
        // (100 * 10 + 300 * 30) / 400
        assert_eq!(polls[idx("poll_ed_4yr")], Some(25));
        assert_eq!(polls[idx("poll_gender_male")], None);
        assert_eq!(rows[0].to_record().len(), FeatureRow::header().len());
    }

    #[test]
    fn final_polls_pass_through() {
        let census = record(&[]);
        let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
        deltas.insert("Age_18-34".to_string(), 24);
        let table = JoinedTable {
            year: 2020,
            census_fields: vec![],
            poll_columns: vec![],
            buckets: PollBuckets::Final,
            rows: vec![JoinedRow {
                year: 2020,
                key: census.key.clone(),
                votes: VoteRecord::empty(census.key.clone()),
                prev_party: "d".to_string(),
                census,
                poll_deltas: deltas,
            }],
        };
        let rows = normalize_table(&table);
        assert_eq!(rows[0].polls[2], Some(24));
        assert_eq!(rows[0].to_record()[7], "d");
    }

    #[test]
    fn every_census_year_derives_the_full_schema() {
        for year in CENSUS_PARSE_YEARS.iter() {
            let fields: Vec<String> = census_fields(*year)
                .unwrap()
                .iter()
                .map(|(_, n)| n.to_string())
                .collect();
            assert_eq!(derivable_columns(&fields), FeatureRow::header(), "year {}", year);
        }
        let partial = vec!["age_pop".to_string()];
        assert!(derivable_columns(&partial).len() < FeatureRow::header().len());
    }
}
