mod config;
pub mod builder;
pub mod district;
pub mod exit_polls;
pub mod manual;
pub mod normalize;
pub mod quick_start;

use log::{debug, info, warn};

use std::collections::BTreeMap;

pub use crate::config::*;
pub use crate::district::{DistrictError, DistrictKey};
use crate::district::parse_results_label;
use crate::exit_polls::poll_deltas;

/// The vote records of every cycle processed so far.
///
/// The join of a cycle needs the winners of the cycle before it. The history
/// is handed to each cycle step and handed back with that cycle added.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct VoteHistory {
    by_year: BTreeMap<u32, BTreeMap<DistrictKey, VoteRecord>>,
}

impl VoteHistory {
    pub fn new() -> VoteHistory {
        VoteHistory::default()
    }

    pub fn record(&mut self, year: u32, votes: BTreeMap<DistrictKey, VoteRecord>) {
        debug!("record: {} districts for {}", votes.len(), year);
        self.by_year.insert(year, votes);
    }

    pub fn cycle(&self, year: u32) -> Option<&BTreeMap<DistrictKey, VoteRecord>> {
        self.by_year.get(&year)
    }

    pub fn winner(&self, year: u32, key: &DistrictKey) -> Option<&VoteRecord> {
        self.by_year.get(&year).and_then(|c| c.get(key))
    }

    /// The recorded years, oldest first.
    pub fn years(&self) -> Vec<u32> {
        self.by_year.keys().cloned().collect()
    }
}

/// The vote results of one cycle, in the shape of their source.
#[derive(PartialEq, Debug, Clone)]
pub enum CycleResults {
    HouseHistory(Vec<HouseResultRow>),
    Scraped(Vec<ScrapedResultRow>),
}

/// Everything read from disk for one cycle.
#[derive(PartialEq, Debug, Clone)]
pub struct CycleInputs {
    pub results: CycleResults,
    pub census: Option<CensusTable>,
    pub exit_poll: Option<Vec<ExitPollRow>>,
}

fn party_initial(party: &str) -> String {
    party
        .trim()
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_default()
}

/// Sums the general election votes of one year of the historical results.
pub fn tally_house_results(
    rows: &[HouseResultRow],
    year: u32,
) -> BTreeMap<DistrictKey, VoteRecord> {
    let mut res: BTreeMap<DistrictKey, VoteRecord> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.year == year && r.stage == "gen") {
        let district = match row.district.trim().parse::<u32>() {
            Ok(d) => d,
            Err(_) => {
                warn!(
                    "tally_house_results: invalid district {:?} for {} in {}",
                    row.district, row.state_po, year
                );
                continue;
            }
        };
        let key = DistrictKey::new(&row.state_po, district);
        let rec = res.entry(key.clone()).or_insert_with(|| {
            let mut r = VoteRecord::empty(key);
            r.total = row.total_votes;
            r
        });
        let party = row.party.trim().to_lowercase();
        if DEMOCRAT_PARTIES.contains(&party.as_str()) {
            rec.dem += row.candidate_votes;
        } else if REPUBLICAN_PARTIES.contains(&party.as_str()) {
            rec.rep += row.candidate_votes;
        }
        if row.candidate_votes > rec.winner_votes {
            rec.winner = row.candidate.trim().to_string();
            rec.winner_votes = row.candidate_votes;
            rec.winner_party = party_initial(&party);
        }
    }
    info!("tally_house_results: {} districts in {}", res.len(), year);
    res
}

/// Reads the vote records of the scraped results.
///
/// Rows are keyed by their district key, or by their heading when the key is
/// not readable. An unknown state is an error.
pub fn tally_scraped_results(
    rows: &[ScrapedResultRow],
) -> Result<BTreeMap<DistrictKey, VoteRecord>, DistrictError> {
    let mut res: BTreeMap<DistrictKey, VoteRecord> = BTreeMap::new();
    for row in rows.iter() {
        let key = match DistrictKey::parse(&row.district) {
            Ok(k) => k,
            Err(_) => match parse_results_label(&row.district_name) {
                Ok(k) => k,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("tally_scraped_results: skipping row: {}", e);
                    continue;
                }
            },
        };
        let dem_won = row.dem_candidate.contains('*');
        let gop_won = row.gop_candidate.contains('*');
        let mut rec = VoteRecord::empty(key.clone());
        rec.dem = row.dem_votes;
        rec.rep = row.gop_votes;
        rec.total = row.dem_votes + row.gop_votes;
        let winner = if dem_won || (!gop_won && row.dem_votes > row.gop_votes) {
            Some((&row.dem_candidate, row.dem_votes, "d"))
        } else if gop_won || row.gop_votes > row.dem_votes {
            Some((&row.gop_candidate, row.gop_votes, "r"))
        } else {
            None
        };
        match winner {
            Some((name, votes, party)) => {
                rec.winner = name.replace('*', "").trim().to_string();
                rec.winner_votes = votes;
                rec.winner_party = party.to_string();
            }
            None => debug!("tally_scraped_results: no winner yet in {}", key),
        }
        res.insert(key, rec);
    }
    info!("tally_scraped_results: {} districts", res.len());
    Ok(res)
}

/// Whether two spellings name the same candidate.
///
/// The sources disagree on case and on first names: `NEAL, RICHARD` style
/// names are not handled, but a bare last name matches the last word of a
/// full name.
pub fn same_candidate(a: &str, b: &str) -> bool {
    let clean = |s: &str| s.replace('*', "").trim().to_lowercase();
    let (a, b) = (clean(a), clean(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let wa: Vec<&str> = a.split_whitespace().collect();
    let wb: Vec<&str> = b.split_whitespace().collect();
    match (wa.as_slice(), wb.as_slice()) {
        ([single], [.., last]) | ([.., last], [single]) => single == last,
        _ => false,
    }
}

/// Flags the winners who also won the same district in the previous cycle.
pub fn mark_incumbents(
    votes: &mut BTreeMap<DistrictKey, VoteRecord>,
    previous: Option<&BTreeMap<DistrictKey, VoteRecord>>,
) {
    let previous = match previous {
        Some(p) => p,
        None => return,
    };
    for (key, rec) in votes.iter_mut() {
        if let Some(prev) = previous.get(key) {
            rec.incumbent = same_candidate(&rec.winner, &prev.winner);
        }
    }
}

/// Joins votes, census counts and poll deltas of one cycle.
///
/// There is one row per census district. Districts without votes get zero
/// votes; districts with votes but no census record are logged and dropped.
pub fn join_cycle(
    cycle: &ElectionCycle,
    votes: &BTreeMap<DistrictKey, VoteRecord>,
    census: &CensusTable,
    poll: &BTreeMap<String, i64>,
    history: &VoteHistory,
) -> JoinedTable {
    let mut rows: Vec<JoinedRow> = Vec::new();
    for (key, census_rec) in census.records.iter() {
        let rec = match votes.get(key) {
            Some(r) => r.clone(),
            None => {
                if !key.is_known_uncontested() {
                    warn!("join_cycle: no voting results for {} {}", cycle.year, key);
                }
                VoteRecord::empty(key.clone())
            }
        };
        let prev_party = history
            .winner(cycle.year - 2, key)
            .map(|r| r.winner_party.clone())
            .unwrap_or_default();
        rows.push(JoinedRow {
            year: cycle.year,
            key: key.clone(),
            votes: rec,
            prev_party,
            census: census_rec.clone(),
            poll_deltas: poll.clone(),
        });
    }
    for key in votes.keys().filter(|k| !census.records.contains_key(k)) {
        warn!("join_cycle: no census record for {} {}", cycle.year, key);
    }
    info!(
        "join_cycle: {} rows for {} (census {}, {} poll columns)",
        rows.len(),
        cycle.year,
        census.year,
        poll.len()
    );
    JoinedTable {
        year: cycle.year,
        census_fields: census.field_names.clone(),
        poll_columns: cycle
            .poll_buckets
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect(),
        buckets: cycle.poll_buckets,
        rows,
    }
}

/// Runs one cycle: tallies its votes, joins them when the cycle has a census
/// snapshot, and returns the history with the cycle added.
///
/// Arguments:
/// * `cycle` the cycle to process
/// * `inputs` the data read for this cycle
/// * `history` the vote records of the previous cycles
pub fn run_cycle(
    cycle: &ElectionCycle,
    inputs: CycleInputs,
    mut history: VoteHistory,
) -> Result<(Option<JoinedTable>, VoteHistory), DistrictError> {
    let mut votes = match &inputs.results {
        CycleResults::HouseHistory(rows) => tally_house_results(rows, cycle.year),
        CycleResults::Scraped(rows) => tally_scraped_results(rows)?,
    };
    mark_incumbents(&mut votes, history.cycle(cycle.year - 2));

    let table = match (cycle.census_year, &inputs.census) {
        (Some(_), Some(census)) => {
            let deltas = match &inputs.exit_poll {
                Some(rows) => poll_deltas(rows, cycle.poll_buckets),
                None => {
                    warn!("run_cycle: no exit poll for {}", cycle.year);
                    BTreeMap::new()
                }
            };
            Some(join_cycle(cycle, &votes, census, &deltas, &history))
        }
        (Some(year), None) => {
            warn!(
                "run_cycle: no census table {} for cycle {}, not joined",
                year, cycle.year
            );
            None
        }
        (None, _) => None,
    };
    history.record(cycle.year, votes);
    Ok((table, history))
}

/// The winning party of every district of the latest cycle, for each cycle,
/// newest first. Cycles without any vote record are left out.
///
/// Returns the years (newest first) and one row per district with an
/// uppercase party initial per year, empty when unknown.
pub fn party_changes(history: &VoteHistory) -> (Vec<u32>, Vec<(DistrictKey, Vec<String>)>) {
    let years: Vec<u32> = history
        .years()
        .into_iter()
        .rev()
        .filter(|y| history.cycle(*y).map(|c| !c.is_empty()).unwrap_or(false))
        .collect();
    let latest = match years.first().and_then(|y| history.cycle(*y)) {
        Some(c) => c,
        None => return (years, Vec::new()),
    };
    let rows = latest
        .keys()
        .map(|key| {
            let parties: Vec<String> = years
                .iter()
                .map(|y| {
                    history
                        .winner(*y, key)
                        .map(|r| r.winner_party.to_uppercase())
                        .unwrap_or_default()
                })
                .collect();
            (key.clone(), parties)
        })
        .collect();
    (years, rows)
}
