//! District keys and the parsing of free-text district labels.
//!
//! Every source names districts differently:
//! - the census API: `Congressional District 3 (116th Congress), California`
//!   and `Congressional District (at Large) (116th Congress), Alaska`
//! - the results pages: `Massachusetts's 3rd district`, `Alaska's At-large district`
//! - the results files: `CA-3` or `CA-03`
//!
//! All of them end up as a [DistrictKey].

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CENSUS_DISTRICT_RE: Regex = Regex::new(r"^Congressional District (\d+) ").unwrap();
    static ref AT_LARGE_RE: Regex = Regex::new(r"^(.*)'s? At-large district").unwrap();
    static ref NUMBERED_RE: Regex = Regex::new(r"^(.*)'s? (\d+)\w+ district").unwrap();
    static ref KEY_RE: Regex = Regex::new(r"^([A-Z]{2})-(\d+)$").unwrap();
}

/// Errors from district name parsing.
///
/// Only [DistrictError::UnknownState] is fatal for a run: no key can be
/// produced at all. The other ones concern a single record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DistrictError {
    UnknownState { name: String },
    UnrecognizedLabel { label: String },
    InvalidKey { key: String },
    UnknownCensusYear { year: u32 },
}

impl Error for DistrictError {}

impl Display for DistrictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistrictError::UnknownState { name } => write!(f, "unknown state name {:?}", name),
            DistrictError::UnrecognizedLabel { label } => {
                write!(f, "unrecognized district label {:?}", label)
            }
            DistrictError::InvalidKey { key } => write!(f, "invalid district key {:?}", key),
            DistrictError::UnknownCensusYear { year } => {
                write!(f, "no census field table for {}", year)
            }
        }
    }
}

impl DistrictError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DistrictError::UnknownState { .. })
    }
}

// https://gist.github.com/rogerallen/1583593
const STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("American Samoa", "AS"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Guam", "GU"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Northern Mariana Islands", "MP"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Puerto Rico", "PR"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virgin Islands", "VI"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// The full names of all the states and territories, in alphabetical order.
pub fn state_names() -> impl Iterator<Item = &'static str> {
    STATES.iter().map(|(name, _)| *name)
}

/// The 2-letter postal abbreviation of a state or territory.
pub fn state_abbreviation(name: &str) -> Result<&'static str, DistrictError> {
    STATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, abbr)| *abbr)
        .ok_or_else(|| DistrictError::UnknownState {
            name: name.to_string(),
        })
}

/// The path element of a state on the results site.
pub fn state_slug(name: &str) -> String {
    let name = if name == "District of Columbia" {
        "Washington DC"
    } else {
        name
    };
    name.to_lowercase().replace(' ', "-")
}

/// The canonical `STATE-DISTRICT` identifier.
///
/// At-large districts have the number 1. Keys order lexicographically on
/// their display form (`CA-10` comes before `CA-2`).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DistrictKey {
    pub state: String,
    pub district: u32,
}

impl DistrictKey {
    pub fn new(state: &str, district: u32) -> DistrictKey {
        DistrictKey {
            state: state.to_string(),
            // At-large seats are numbered 0 in some sources.
            district: district.max(1),
        }
    }

    /// Parses `XX-N`, with or without zero padding.
    pub fn parse(key: &str) -> Result<DistrictKey, DistrictError> {
        let invalid = || DistrictError::InvalidKey {
            key: key.to_string(),
        };
        let caps = KEY_RE.captures(key.trim()).ok_or_else(invalid)?;
        let district = caps[2].parse::<u32>().map_err(|_| invalid())?;
        Ok(DistrictKey::new(&caps[1], district))
    }

    /// The form used by the scraped results file: `CA-03`.
    pub fn padded(&self) -> String {
        format!("{}-{:02}", self.state, self.district)
    }

    pub fn is_known_uncontested(&self) -> bool {
        let s = self.to_string();
        crate::config::KNOWN_UNCONTESTED.iter().any(|k| *k == s)
    }
}

impl Display for DistrictKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.state, self.district)
    }
}

impl Ord for DistrictKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.state
            .cmp(&other.state)
            .then_with(|| self.district.to_string().cmp(&other.district.to_string()))
    }
}

impl PartialOrd for DistrictKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parses a census district label:
/// `Congressional District 3 (116th Congress), California`.
///
/// The state is the text after the last `", "`. A label without a leading
/// district number is an at-large district.
pub fn parse_census_label(label: &str) -> Result<DistrictKey, DistrictError> {
    let state = match label.rfind(", ") {
        Some(idx) => &label[idx + 2..],
        None => {
            return Err(DistrictError::UnrecognizedLabel {
                label: label.to_string(),
            })
        }
    };
    let abbr = state_abbreviation(state)?;
    let district = CENSUS_DISTRICT_RE
        .captures(label)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(1);
    Ok(DistrictKey::new(abbr, district))
}

/// Parses a results page heading: `Massachusetts's 3rd district` or
/// `Alaska's At-large district`.
pub fn parse_results_label(label: &str) -> Result<DistrictKey, DistrictError> {
    if let Some(caps) = AT_LARGE_RE.captures(label) {
        let abbr = state_abbreviation(&caps[1])?;
        return Ok(DistrictKey::new(abbr, 1));
    }
    if let Some(caps) = NUMBERED_RE.captures(label) {
        let abbr = state_abbreviation(&caps[1])?;
        let district = caps[2]
            .parse::<u32>()
            .map_err(|_| DistrictError::UnrecognizedLabel {
                label: label.to_string(),
            })?;
        return Ok(DistrictKey::new(abbr, district));
    }
    Err(DistrictError::UnrecognizedLabel {
        label: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn census_label_numbered() {
        let k =
            parse_census_label("Congressional District 3 (116th Congress), California").unwrap();
        assert_eq!(k.state, "CA");
        assert_eq!(k.district.to_string(), "3");
        assert_eq!(k.to_string(), "CA-3");
    }

    #[test]
    fn census_label_at_large() {
        let k = parse_census_label("Congressional District (at Large) (116th Congress), Alaska")
            .unwrap();
        assert_eq!(k, DistrictKey::new("AK", 1));
        let k = parse_census_label(
            "Delegate District (at Large) (113th Congress), District of Columbia",
        )
        .unwrap();
        assert_eq!(k.to_string(), "DC-1");
    }

    #[test]
    fn census_label_unknown_state_is_fatal() {
        let e =
            parse_census_label("Congressional District 1 (116th Congress), Atlantis").unwrap_err();
        assert!(e.is_fatal());
        let e = parse_census_label("Congressional District 1").unwrap_err();
        assert!(!e.is_fatal());
    }

    #[test]
    fn results_labels() {
        assert_eq!(
            parse_results_label("Massachusetts's 3rd district").unwrap(),
            DistrictKey::new("MA", 3)
        );
        assert_eq!(
            parse_results_label("Texas' 22nd district").unwrap(),
            DistrictKey::new("TX", 22)
        );
        assert_eq!(
            parse_results_label("Alaska's At-large district").unwrap(),
            DistrictKey::new("AK", 1)
        );
        assert!(parse_results_label("Senate").is_err());
    }

    #[test]
    fn keys_parse_padded_and_unpadded() {
        assert_eq!(DistrictKey::parse("MA-03").unwrap(), DistrictKey::new("MA", 3));
        assert_eq!(DistrictKey::parse("MA-3").unwrap().padded(), "MA-03");
        assert_eq!(DistrictKey::parse("AK-00").unwrap().to_string(), "AK-1");
        assert!(DistrictKey::parse("Massachusetts-3").is_err());
    }

    #[test]
    fn keys_sort_as_strings() {
        let mut keys = vec![
            DistrictKey::new("CA", 2),
            DistrictKey::new("CA", 10),
            DistrictKey::new("AL", 7),
        ];
        keys.sort();
        let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["AL-7", "CA-10", "CA-2"]);
    }

    #[test]
    fn slugs() {
        assert_eq!(state_slug("New Hampshire"), "new-hampshire");
        assert_eq!(state_slug("District of Columbia"), "washington-dc");
    }
}
