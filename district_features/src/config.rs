// ********* Input data structures ***********

use std::collections::BTreeMap;

use crate::district::DistrictKey;

/// One candidate line of the historical house results (one row per candidate,
/// per district, per election stage).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HouseResultRow {
    pub year: u32,
    /// `gen` for general elections, `pri` for primaries.
    pub stage: String,
    pub state_po: String,
    /// `0` for at-large seats.
    pub district: String,
    pub candidate: String,
    pub party: String,
    pub candidate_votes: u64,
    pub total_votes: u64,
}

/// One district of the scraped current-cycle results.
///
/// Only the leading candidate of each party is kept by the scraper. A `*` in a
/// candidate name marks the declared winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScrapedResultRow {
    pub district_name: String,
    /// Zero-padded district key, for example `MA-03`.
    pub district: String,
    pub dem_candidate: String,
    pub gop_candidate: String,
    pub dem_votes: u64,
    pub gop_votes: u64,
}

/// One (question, answer) line of a normalized exit poll, with the summed
/// percentages of the democrat, republican and all other candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExitPollRow {
    pub question: String,
    pub answer: String,
    pub dem: i64,
    pub rep: i64,
    pub other: i64,
}

// ******** Output data structures *********

/// The house vote of one district for one cycle.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub key: DistrictKey,
    pub dem: u64,
    pub rep: u64,
    pub total: u64,
    pub winner: String,
    /// First letter of the winning party (`d`, `r`, ...), empty when unknown.
    pub winner_party: String,
    pub winner_votes: u64,
    pub incumbent: bool,
}

impl VoteRecord {
    pub fn empty(key: DistrictKey) -> VoteRecord {
        VoteRecord {
            key,
            dem: 0,
            rep: 0,
            total: 0,
            winner: String::new(),
            winner_party: String::new(),
            winner_votes: 0,
            incumbent: false,
        }
    }
}

/// The named demographic counts of one district.
#[derive(PartialEq, Debug, Clone)]
pub struct CensusRecord {
    pub key: DistrictKey,
    pub fields: BTreeMap<String, f64>,
}

impl CensusRecord {
    pub fn new(key: DistrictKey) -> CensusRecord {
        CensusRecord {
            key,
            fields: BTreeMap::new(),
        }
    }

    /// The value of a field, 0 when the field is not present.
    pub fn get(&self, name: &str) -> f64 {
        self.fields.get(name).copied().unwrap_or(0.0)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// All the districts of one census year, sorted by key.
#[derive(PartialEq, Debug, Clone)]
pub struct CensusTable {
    pub year: u32,
    /// The semantic field names, in the order of the field table of the year.
    pub field_names: Vec<String>,
    pub records: BTreeMap<DistrictKey, CensusRecord>,
}

/// One output row of the join: votes, census counts and exit-poll deltas of a
/// district for one election cycle.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinedRow {
    pub year: u32,
    pub key: DistrictKey,
    pub votes: VoteRecord,
    /// Winning party of the previous cycle, empty when unknown.
    pub prev_party: String,
    pub census: CensusRecord,
    /// Democrat minus republican points, by allow-listed poll column.
    pub poll_deltas: BTreeMap<String, i64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct JoinedTable {
    pub year: u32,
    pub census_fields: Vec<String>,
    pub poll_columns: Vec<String>,
    pub buckets: PollBuckets,
    pub rows: Vec<JoinedRow>,
}

// ********* Configuration **********

/// The ACS profile groups that contain at least one mapped field.
pub const CENSUS_GROUPS: [&str; 3] = ["DP02", "DP03", "DP05"];

/// Years with ACS 1-year profiles by congressional district.
/// 2015 was never published at that geography.
pub fn census_download_years() -> Vec<u32> {
    (2009..2020).filter(|y| *y != 2015).collect()
}

/// Years with a field table, and therefore a parsed census file.
pub const CENSUS_PARSE_YEARS: [u32; 5] = [2012, 2014, 2016, 2018, 2019];

// The codes below come from the labels of the profile variables:
//   CITIZEN, VOTING AGE POPULATION  or  SEX AND AGE + U.S. CITIZENSHIP STATUS
//   RACE
//   EDUCATIONAL ATTAINMENT
//   SEX AND AGE
//   INCOME AND BENEFITS
// https://api.census.gov/data/<year>/acs/acs1/profile/variables.html

const FIELDS_2019: &[(&str, &str)] = &[
    ("DP05_0087E", "voteage_pop"),
    ("DP05_0088E", "voteage_m"),
    ("DP05_0089E", "voteage_f"),
    ("DP05_0033E", "race_pop"),
    ("DP05_0037E", "race_white"),
    ("DP05_0065E", "race_black"),
    ("DP05_0067E", "race_asian"),
    ("DP05_0071E", "race_hisp"),
    ("DP02_0059E", "ed_pop"),
    ("DP02_0065E", "ed_ba"),
    ("DP02_0066E", "ed_grdeg"),
    ("DP05_0001E", "age_pop"),
    ("DP05_0009E", "age_20_24"),
    ("DP05_0010E", "age_25_34"),
    ("DP05_0011E", "age_35_44"),
    ("DP05_0012E", "age_45_54"),
    ("DP05_0013E", "age_55_59"),
    ("DP05_0014E", "age_60_64"),
    ("DP05_0021E", "age_18_plus"),
    ("DP05_0022E", "age_21_plus"),
    ("DP05_0024E", "age_65_plus"),
    ("DP03_0051E", "inc_pop"),
    ("DP03_0052E", "inc_less_10"),
    ("DP03_0053E", "inc_10_14"),
    ("DP03_0054E", "inc_15_24"),
    ("DP03_0055E", "inc_25_34"),
    ("DP03_0056E", "inc_35_49"),
    ("DP03_0057E", "inc_50_74"),
    ("DP03_0058E", "inc_75_99"),
    ("DP03_0059E", "inc_100_149"),
    ("DP03_0060E", "inc_150_199"),
    ("DP03_0061E", "inc_200_plus"),
];

// Same as 2019, except for the education block of DP02.
const FIELDS_2018: &[(&str, &str)] = &[
    ("DP05_0087E", "voteage_pop"),
    ("DP05_0088E", "voteage_m"),
    ("DP05_0089E", "voteage_f"),
    ("DP05_0033E", "race_pop"),
    ("DP05_0037E", "race_white"),
    ("DP05_0065E", "race_black"),
    ("DP05_0067E", "race_asian"),
    ("DP05_0071E", "race_hisp"),
    ("DP02_0058E", "ed_pop"),
    ("DP02_0064E", "ed_ba"),
    ("DP02_0065E", "ed_grdeg"),
    ("DP05_0001E", "age_pop"),
    ("DP05_0009E", "age_20_24"),
    ("DP05_0010E", "age_25_34"),
    ("DP05_0011E", "age_35_44"),
    ("DP05_0012E", "age_45_54"),
    ("DP05_0013E", "age_55_59"),
    ("DP05_0014E", "age_60_64"),
    ("DP05_0021E", "age_18_plus"),
    ("DP05_0022E", "age_21_plus"),
    ("DP05_0024E", "age_65_plus"),
    ("DP03_0051E", "inc_pop"),
    ("DP03_0052E", "inc_less_10"),
    ("DP03_0053E", "inc_10_14"),
    ("DP03_0054E", "inc_15_24"),
    ("DP03_0055E", "inc_25_34"),
    ("DP03_0056E", "inc_35_49"),
    ("DP03_0057E", "inc_50_74"),
    ("DP03_0058E", "inc_75_99"),
    ("DP03_0059E", "inc_100_149"),
    ("DP03_0060E", "inc_150_199"),
    ("DP03_0061E", "inc_200_plus"),
];

const FIELDS_2016: &[(&str, &str)] = &[
    ("DP05_0082E", "voteage_pop"),
    ("DP05_0083E", "voteage_m"),
    ("DP05_0084E", "voteage_f"),
    ("DP05_0028E", "race_pop"),
    ("DP05_0032E", "race_white"),
    ("DP05_0060E", "race_black"),
    ("DP05_0062E", "race_asian"),
    ("DP05_0066E", "race_hisp"),
    ("DP02_0058E", "ed_pop"),
    ("DP02_0064E", "ed_ba"),
    ("DP02_0065E", "ed_grdeg"),
    ("DP05_0001E", "age_pop"),
    ("DP05_0008E", "age_20_24"),
    ("DP05_0009E", "age_25_34"),
    ("DP05_0010E", "age_35_44"),
    ("DP05_0011E", "age_45_54"),
    ("DP05_0012E", "age_55_59"),
    ("DP05_0013E", "age_60_64"),
    ("DP05_0018E", "age_18_plus"),
    ("DP05_0019E", "age_21_plus"),
    ("DP05_0021E", "age_65_plus"),
    ("DP03_0051E", "inc_pop"),
    ("DP03_0052E", "inc_less_10"),
    ("DP03_0053E", "inc_10_14"),
    ("DP03_0054E", "inc_15_24"),
    ("DP03_0055E", "inc_25_34"),
    ("DP03_0056E", "inc_35_49"),
    ("DP03_0057E", "inc_50_74"),
    ("DP03_0058E", "inc_75_99"),
    ("DP03_0059E", "inc_100_149"),
    ("DP03_0060E", "inc_150_199"),
    ("DP03_0061E", "inc_200_plus"),
];

// No citizen voting-age block before 2016: the sex split is over all ages and
// the citizen share comes as a percentage.
const FIELDS_2012_2014: &[(&str, &str)] = &[
    ("DP05_0001E", "age_pop"),
    ("DP05_0002E", "allage_m"),
    ("DP05_0003E", "allage_f"),
    ("DP05_0018E", "age_18_plus"),
    ("DP02_0095PE", "allage_citzenpct"),
    ("DP05_0028E", "race_pop"),
    ("DP05_0032E", "race_white"),
    ("DP05_0060E", "race_black"),
    ("DP05_0062E", "race_asian"),
    ("DP05_0066E", "race_hisp"),
    ("DP02_0058E", "ed_pop"),
    ("DP02_0064E", "ed_ba"),
    ("DP02_0065E", "ed_grdeg"),
    ("DP05_0008E", "age_20_24"),
    ("DP05_0009E", "age_25_34"),
    ("DP05_0010E", "age_35_44"),
    ("DP05_0011E", "age_45_54"),
    ("DP05_0012E", "age_55_59"),
    ("DP05_0013E", "age_60_64"),
    ("DP05_0019E", "age_21_plus"),
    ("DP05_0021E", "age_65_plus"),
    ("DP03_0051E", "inc_pop"),
    ("DP03_0052E", "inc_less_10"),
    ("DP03_0053E", "inc_10_14"),
    ("DP03_0054E", "inc_15_24"),
    ("DP03_0055E", "inc_25_34"),
    ("DP03_0056E", "inc_35_49"),
    ("DP03_0057E", "inc_50_74"),
    ("DP03_0058E", "inc_75_99"),
    ("DP03_0059E", "inc_100_149"),
    ("DP03_0060E", "inc_150_199"),
    ("DP03_0061E", "inc_200_plus"),
];

/// The census variable code to field name table of a year, in output order.
/// A new year is supported by adding its table here.
pub fn census_fields(year: u32) -> Option<&'static [(&'static str, &'static str)]> {
    match year {
        2019 => Some(FIELDS_2019),
        2018 => Some(FIELDS_2018),
        2016 => Some(FIELDS_2016),
        2012 | 2014 => Some(FIELDS_2012_2014),
        _ => None,
    }
}

/// Where the vote totals of a cycle come from.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ResultsSource {
    /// The historical house results file (1976-2018).
    HouseHistory,
    /// The scraped results of the current cycle.
    Scraped,
}

/// How an exit poll reports its demographic buckets.
///
/// - Narrow buckets (up to 2018) are finer than the final schema and are
/// aggregated with census weights by the column normalizer.
///
/// - Final buckets (2020) already match the final schema.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PollBuckets {
    Narrow,
    Final,
}

// Have the following limited demographic data for predictions
//  Gender: Male, Female
//  Age: 18-34,35-49,50-64,65+
//  Income: <$50K,$50-100K,$100K+
//  Race: White non-Hisp,Hsp-Blk-Asn-Oth
//  Education: No degree,4 yr degree
// The narrow columns are selected to be close to those.
const NARROW_COLUMNS: &[&str] = &[
    "Gender_Male",
    "Gender_Female",
    "Age_18-29",
    "Age_30-39",
    "Age_40-49",
    "Age_50-64",
    "Age_65 and Older",
    "Income_Less Than $50K",
    "Income_$50-100K",
    "Income_$100K or More",
    "Race_White",
    "Race_Black",
    "Race_Latino",
    "Race_Asian",
    "Race_Other",
    "Education_HS or less",
    "Education_College Graduate",
    "Education_Postgraduate",
];

const NARROW_ANSWER_SYNONYMS: &[(&str, &str)] = &[
    ("Men", "Male"),
    ("Women", "Female"),
    ("African-American", "Black"),
    ("Other race", "Other"),
    ("Bachelor's degree", "College Graduate"),
    ("College graduate", "College Graduate"),
    ("Advanced degree", "Postgraduate"),
    ("65 and older", "65 and Older"),
    ("Under $50K", "Less Than $50K"),
    ("$50K-$100K", "$50-100K"),
    ("$100K or more", "$100K or More"),
];

const NARROW_KEY_SYNONYMS: &[(&str, &str)] = &[
    ("Are you a college graduate?,No", "Education,HS or less"),
    ("Are You a College Graduate?,No", "Education,HS or less"),
];

const FINAL_COLUMNS: &[&str] = &[
    "Gender_Male",
    "Gender_Female",
    "Age_18-34",
    "Age_35-49",
    "Age_50-64",
    "Age_65 and Older",
    "Income_Less Than $50K",
    "Income_$50-100K",
    "Income_$100K or More",
    "Race_White",
    "Race_Nonwhite",
    "Education_No degree",
    "Education_4 yr degree",
];

const FINAL_ANSWER_SYNONYMS: &[(&str, &str)] = &[
    ("Men", "Male"),
    ("Women", "Female"),
    ("65 and older", "65 and Older"),
    ("Under $50,000", "Less Than $50K"),
    ("Under $50K", "Less Than $50K"),
    ("$50,000-$99,999", "$50-100K"),
    ("$50K-$99K", "$50-100K"),
    ("$100,000 or more", "$100K or More"),
    ("$100K or more", "$100K or More"),
    ("Non-White", "Nonwhite"),
    ("Non-white", "Nonwhite"),
    ("Nonwhite", "Nonwhite"),
];

const FINAL_KEY_SYNONYMS: &[(&str, &str)] = &[
    ("Education,No college degree", "Education,No degree"),
    ("Education,College graduate", "Education,4 yr degree"),
    ("Education,College degree", "Education,4 yr degree"),
    ("Are you a college graduate?,No", "Education,No degree"),
    ("Are you a college graduate?,Yes", "Education,4 yr degree"),
];

impl PollBuckets {
    /// The allow-listed `<Question>_<Answer>` columns.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            PollBuckets::Narrow => NARROW_COLUMNS,
            PollBuckets::Final => FINAL_COLUMNS,
        }
    }

    pub fn answer_synonyms(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PollBuckets::Narrow => NARROW_ANSWER_SYNONYMS,
            PollBuckets::Final => FINAL_ANSWER_SYNONYMS,
        }
    }

    /// Synonyms over the full `<Question>,<Answer>` key, applied after the
    /// answer synonyms.
    pub fn key_synonyms(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PollBuckets::Narrow => NARROW_KEY_SYNONYMS,
            PollBuckets::Final => FINAL_KEY_SYNONYMS,
        }
    }
}

/// One house election cycle of the join.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionCycle {
    pub year: u32,
    /// The census snapshot joined to this cycle. `None` for cycles that only
    /// seed the vote history.
    pub census_year: Option<u32>,
    pub results: ResultsSource,
    /// Key of the house exit poll (`2018h`).
    pub exit_poll: Option<&'static str>,
    pub poll_buckets: PollBuckets,
}

/// The cycles of the house join, oldest first.
///
/// The most recent cycle has no census release yet: it is joined with the
/// previous year's snapshot and with the scraped results.
pub const HOUSE_CYCLES: &[ElectionCycle] = &[
    ElectionCycle {
        year: 2010,
        census_year: None,
        results: ResultsSource::HouseHistory,
        exit_poll: None,
        poll_buckets: PollBuckets::Narrow,
    },
    ElectionCycle {
        year: 2012,
        census_year: Some(2012),
        results: ResultsSource::HouseHistory,
        exit_poll: Some("2012h"),
        poll_buckets: PollBuckets::Narrow,
    },
    ElectionCycle {
        year: 2014,
        census_year: Some(2014),
        results: ResultsSource::HouseHistory,
        exit_poll: Some("2014h"),
        poll_buckets: PollBuckets::Narrow,
    },
    ElectionCycle {
        year: 2016,
        census_year: Some(2016),
        results: ResultsSource::HouseHistory,
        exit_poll: Some("2016h"),
        poll_buckets: PollBuckets::Narrow,
    },
    ElectionCycle {
        year: 2018,
        census_year: Some(2018),
        results: ResultsSource::HouseHistory,
        exit_poll: Some("2018h"),
        poll_buckets: PollBuckets::Narrow,
    },
    ElectionCycle {
        year: 2020,
        census_year: Some(2019),
        results: ResultsSource::Scraped,
        exit_poll: Some("2020h"),
        poll_buckets: PollBuckets::Final,
    },
];

/// Parties whose votes count as democrat votes in the house results.
pub const DEMOCRAT_PARTIES: [&str; 2] = ["democrat", "democratic-farmer-labor"];
pub const REPUBLICAN_PARTIES: [&str; 1] = ["republican"];

/// Districts that are expected to have no house vote record.
/// The non-voting delegates are not always in the results file.
// TODO: replace with a per-year list of uncontested races from the results file.
pub const KNOWN_UNCONTESTED: [&str; 2] = ["DC-1", "PR-1"];
