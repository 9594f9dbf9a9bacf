use log::debug;
use std::collections::BTreeMap;

use crate::config::{ExitPollRow, PollBuckets};

/// The allow-list column of a poll line, after the synonym tables are
/// applied. Returns `None` for lines outside the allow-list.
///
/// The question `Vote by Gender` is the same as `Gender`. Answers are renamed
/// first, then the full `<Question>,<Answer>` key.
pub fn poll_column(question: &str, answer: &str, buckets: PollBuckets) -> Option<String> {
    let question = question.trim().trim_start_matches("Vote by ");
    let answer = answer.trim();
    let answer = buckets
        .answer_synonyms()
        .iter()
        .find(|(from, _)| *from == answer)
        .map(|(_, to)| *to)
        .unwrap_or(answer);
    let key = format!("{},{}", question, answer);
    let key = buckets
        .key_synonyms()
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| to.to_string())
        .unwrap_or(key);
    let column = key.replacen(',', "_", 1);
    if buckets.columns().contains(&column.as_str()) {
        Some(column)
    } else {
        None
    }
}

/// The democrat minus republican difference of every allow-listed column
/// found in the poll.
///
/// When a column appears more than once (the same breakdown is sometimes asked
/// twice), the last line wins.
pub fn poll_deltas(rows: &[ExitPollRow], buckets: PollBuckets) -> BTreeMap<String, i64> {
    let mut res: BTreeMap<String, i64> = BTreeMap::new();
    for row in rows.iter() {
        if let Some(col) = poll_column(&row.question, &row.answer, buckets) {
            let delta = row.dem - row.rep;
            debug!("poll_deltas: {} = {}", col, delta);
            res.insert(col, delta);
        }
    }
    res
}
