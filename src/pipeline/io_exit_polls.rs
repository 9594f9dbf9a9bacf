// Readers for the exit polls published by CNN.
//
// Two layouts:
// - `polls` (up to 2018): every question has its own list of candidates.
// - `questions` (2020): the candidates are listed once for the whole file.

use std::fs;
use std::path::Path;

use district_features::ExitPollRow;
use serde::Deserialize;
use serde_json::Value as JSValue;

use crate::pipeline::io_common::*;
use crate::pipeline::*;

#[derive(Debug, Clone, Deserialize)]
struct PollsFile {
    polls: Vec<Poll>,
}

#[derive(Debug, Clone, Deserialize)]
struct Poll {
    question: String,
    #[serde(default)]
    candidates: Vec<PollCandidate>,
    #[serde(default)]
    answers: Vec<PollAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
struct PollCandidate {
    id: JSValue,
    #[serde(default)]
    fname: Option<String>,
    #[serde(default)]
    party: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PollAnswer {
    answer: String,
    #[serde(default)]
    candidateanswers: Vec<PollCandidateAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
struct PollCandidateAnswer {
    id: JSValue,
    pct: JSValue,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionsFile {
    #[serde(default)]
    candidates: Vec<QuestionCandidate>,
    questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionCandidate {
    #[serde(rename = "candidateId")]
    candidate_id: JSValue,
    #[serde(rename = "partyName", default)]
    party_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Question {
    question: String,
    #[serde(default)]
    answers: Vec<QuestionAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionAnswer {
    answer: String,
    #[serde(rename = "candidateAnswers", default)]
    candidate_answers: Vec<QuestionCandidateAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionCandidateAnswer {
    #[serde(rename = "candidateId")]
    candidate_id: JSValue,
    percentage: JSValue,
}

/// Removes the `callback_0(...)` wrapper of a JSONP body.
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(start), Some(end)) if start < end => trimmed[start + 1..end].trim(),
        _ => trimmed,
    }
}

/// The integer value of a percentage: integers as is, strings by their
/// leading digits. Anything else (`"N/A"`, `"-"`) is `None`.
fn read_percentage(v: &JSValue) -> Option<i64> {
    match v {
        JSValue::Number(n) => n.as_i64(),
        JSValue::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    }
}

// Ids are numbers in some files and strings in others.
fn same_id(a: &JSValue, b: &JSValue) -> bool {
    match (a, b) {
        (JSValue::String(x), y) | (y, JSValue::String(x)) => match y {
            JSValue::String(y) => x == y,
            y => *x == y.to_string(),
        },
        (x, y) => x == y,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Side {
    Dem,
    Rep,
    Other,
}

fn tally_answer<'a, I>(answer: &str, question: &str, shares: I) -> ExitPollRow
where
    I: Iterator<Item = (Side, &'a JSValue)>,
{
    let mut row = ExitPollRow {
        question: question.to_string(),
        answer: answer.to_string(),
        dem: 0,
        rep: 0,
        other: 0,
    };
    for (side, pct) in shares {
        let pct = match read_percentage(pct) {
            Some(p) => p,
            None => continue,
        };
        match side {
            Side::Dem => row.dem += pct,
            Side::Rep => row.rep += pct,
            Side::Other => row.other += pct,
        }
    }
    row
}

fn side_of(id: &JSValue, dem: Option<&JSValue>, rep: Option<&JSValue>) -> Side {
    if dem.map(|d| same_id(d, id)).unwrap_or(false) {
        Side::Dem
    } else if rep.map(|r| same_id(r, id)).unwrap_or(false) {
        Side::Rep
    } else {
        Side::Other
    }
}

fn parse_polls(file: &PollsFile) -> Vec<ExitPollRow> {
    let mut res: Vec<ExitPollRow> = Vec::new();
    for poll in file.polls.iter() {
        let is = |c: &&PollCandidate, fname: &str, party: &str| {
            c.fname.as_deref() == Some(fname) || c.party.as_deref() == Some(party)
        };
        let dem = poll
            .candidates
            .iter()
            .filter(|c| is(c, "Democrat", "D"))
            .last()
            .map(|c| &c.id);
        let rep = poll
            .candidates
            .iter()
            .filter(|c| is(c, "Republican", "R"))
            .last()
            .map(|c| &c.id);
        for answer in poll.answers.iter() {
            let shares = answer
                .candidateanswers
                .iter()
                .map(|ca| (side_of(&ca.id, dem, rep), &ca.pct));
            res.push(tally_answer(&answer.answer, &poll.question, shares));
        }
    }
    res
}

fn parse_questions(file: &QuestionsFile) -> Vec<ExitPollRow> {
    let party = |name: &str| {
        file.candidates
            .iter()
            .filter(|c| c.party_name.as_deref() == Some(name))
            .last()
            .map(|c| &c.candidate_id)
    };
    let dem = party("Democratic");
    let rep = party("Republican");
    let mut res: Vec<ExitPollRow> = Vec::new();
    for q in file.questions.iter() {
        for answer in q.answers.iter() {
            let shares = answer
                .candidate_answers
                .iter()
                .map(|ca| (side_of(&ca.candidate_id, dem, rep), &ca.percentage));
            res.push(tally_answer(&answer.answer, &q.question, shares));
        }
    }
    res
}

/// Parses the body of an exit poll file, in either layout.
///
/// A file with neither layout is reported and gives no rows. Only a body
/// that is not JSON at all is an error.
pub fn parse_exit_poll(body: &str, name: &str) -> PrepResult<Vec<ExitPollRow>> {
    let js: JSValue =
        serde_json::from_str(strip_jsonp(body)).context(ParsingJsonSnafu { path: name })?;
    let rows = if js.get("polls").is_some() {
        let file: PollsFile =
            serde_json::from_value(js).context(ParsingJsonSnafu { path: name })?;
        parse_polls(&file)
    } else if js.get("questions").is_some() {
        let file: QuestionsFile =
            serde_json::from_value(js).context(ParsingJsonSnafu { path: name })?;
        parse_questions(&file)
    } else {
        error!("parse_exit_poll: no polls found in {}", name);
        Vec::new()
    };
    debug!("parse_exit_poll: {} rows in {}", rows.len(), name);
    Ok(rows)
}

pub fn exit_poll_header() -> Vec<String> {
    ["question", "answer", "dem", "rep", "other"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parses `exitpolls_<key>.json` into `parsed_exitpolls_<key>.csv`.
///
/// A missing, unreadable or malformed poll is logged and skipped.
pub fn parse_exit_poll_file(data_dir: &Path, key: &str) -> PrepResult<()> {
    let input = data_path(data_dir, &exit_poll_file(key));
    if !input.exists() {
        warn!("parse_exit_poll_file: {} is missing, skipping", path_str(&input));
        return Ok(());
    }
    let body = match fs::read_to_string(&input) {
        Ok(b) => b,
        Err(e) => {
            error!("parse_exit_poll_file: cannot read {}: {}", path_str(&input), e);
            return Ok(());
        }
    };
    let rows = match parse_exit_poll(&body, &path_str(&input)) {
        Ok(rows) => rows,
        Err(e) => {
            error!("parse_exit_poll_file: {}", e);
            return Ok(());
        }
    };
    let output = data_path(data_dir, &parsed_exit_poll_file(key));
    let n = write_csv(
        &output,
        &exit_poll_header(),
        rows.into_iter().map(|r| {
            vec![
                r.question,
                r.answer,
                r.dem.to_string(),
                r.rep.to_string(),
                r.other.to_string(),
            ]
        }),
    )?;
    info!("parse_exit_poll_file: {} lines for {}", n, key);
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedPollLine {
    question: String,
    answer: String,
    dem: i64,
    rep: i64,
    other: i64,
}

/// Reads a parsed exit poll back. `None` when the file is not there.
pub fn read_parsed_exit_poll(data_dir: &Path, key: &str) -> PrepResult<Option<Vec<ExitPollRow>>> {
    let path = data_path(data_dir, &parsed_exit_poll_file(key));
    if !path.exists() {
        return Ok(None);
    }
    let mut rdr = csv_reader(&path)?;
    let mut res: Vec<ExitPollRow> = Vec::new();
    for line in rdr.deserialize() {
        let l: ParsedPollLine = line.context(CsvLineParseSnafu {
            path: path_str(&path),
        })?;
        res.push(ExitPollRow {
            question: l.question,
            answer: l.answer,
            dem: l.dem,
            rep: l.rep,
            other: l.other,
        });
    }
    Ok(Some(res))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_layout_gender() {
        let body = r#"{
            "candidates": [
                {"candidateId": 1036, "partyName": "Democratic"},
                {"candidateId": 8639, "partyName": "Republican"},
                {"candidateId": 9999, "partyName": "Libertarian"}
            ],
            "questions": [{
                "question": "Gender",
                "answers": [
                    {"answer": "Male", "candidateAnswers": [
                        {"candidateId": 1036, "percentage": 45},
                        {"candidateId": 8639, "percentage": "53"},
                        {"candidateId": 9999, "percentage": 2}
                    ]},
                    {"answer": "Female", "candidateAnswers": [
                        {"candidateId": 1036, "percentage": 57},
                        {"candidateId": 8639, "percentage": 42},
                        {"candidateId": 9999, "percentage": "N/A"}
                    ]}
                ]
            }]
        }"#;
        let rows = parse_exit_poll(body, "2020h").unwrap();
        let flat: Vec<(String, String, i64, i64, i64)> = rows
            .into_iter()
            .map(|r| (r.question, r.answer, r.dem, r.rep, r.other))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Gender".to_string(), "Male".to_string(), 45, 53, 2),
                ("Gender".to_string(), "Female".to_string(), 57, 42, 0),
            ]
        );
    }

    #[test]
    fn polls_layout_with_jsonp() {
        let body = r#"callback_0({"polls": [{
            "question": "Age",
            "candidates": [
                {"id": "1", "fname": "Democrat", "party": ""},
                {"id": "2", "fname": "Republican", "party": ""},
                {"id": "3", "fname": "Other", "party": "L"}
            ],
            "answers": [{"answer": "18-29", "candidateanswers": [
                {"id": "1", "pct": "60"},
                {"id": "2", "pct": "37%"},
                {"id": "3", "pct": "3"},
                {"id": "4", "pct": "-"}
            ]}]
        }]})"#;
        let rows = parse_exit_poll(body, "2012h").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].dem, rows[0].rep, rows[0].other), (60, 37, 3));
    }

    #[test]
    fn polls_layout_by_party_and_numeric_ids() {
        let body = r#"{"polls": [{
            "question": "Vote by Gender",
            "candidates": [
                {"id": 11, "fname": "Hillary", "party": "D"},
                {"id": 12, "fname": "Donald", "party": "R"}
            ],
            "answers": [{"answer": "Men", "candidateanswers": [
                {"id": "11", "pct": "41"},
                {"id": 12, "pct": "52"}
            ]}]
        }]}"#;
        let rows = parse_exit_poll(body, "2016p").unwrap();
        assert_eq!((rows[0].dem, rows[0].rep, rows[0].other), (41, 52, 0));
    }

    #[test]
    fn unknown_layout_gives_no_rows() {
        assert!(parse_exit_poll(r#"{"races": []}"#, "x").unwrap().is_empty());
        assert!(parse_exit_poll("<html>", "x").is_err());
    }

    #[test]
    fn parsed_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("exitpolls_2018h.json"),
            r#"{"polls": [{"question": "Gender", "candidates": [{"id": 1, "fname": "Democrat"}],
               "answers": [{"answer": "Women", "candidateanswers": [{"id": 1, "pct": "59"}]}]}]}"#,
        )
        .unwrap();
        parse_exit_poll_file(dir.path(), "2018h").unwrap();
        let rows = read_parsed_exit_poll(dir.path(), "2018h").unwrap().unwrap();
        assert_eq!(rows[0].answer, "Women");
        assert_eq!(rows[0].dem, 59);
        // Missing input: nothing written, no error.
        parse_exit_poll_file(dir.path(), "2016h").unwrap();
        assert!(read_parsed_exit_poll(dir.path(), "2016h").unwrap().is_none());
    }

    #[test]
    fn unreadable_poll_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("exitpolls_2012h.json"),
            b"callback_0({\"polls\": \xff})",
        )
        .unwrap();
        fs::write(dir.path().join("exitpolls_2014h.json"), "{\"polls\": [").unwrap();
        parse_exit_poll_file(dir.path(), "2012h").unwrap();
        parse_exit_poll_file(dir.path(), "2014h").unwrap();
        assert!(read_parsed_exit_poll(dir.path(), "2012h").unwrap().is_none());
        assert!(read_parsed_exit_poll(dir.path(), "2014h").unwrap().is_none());
    }
}
