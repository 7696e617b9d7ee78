//! Lifestyle survey loader
//!
//! Reads the wellbeing survey CSV that backs the served model. Only the
//! columns the model consumes are selected; rows with any of them missing
//! or non-numeric are dropped, the way the training notebooks did.

use std::fs;
use std::path::Path;

use crate::error::PipelineError;
use crate::types::SurveyRecord;

use super::LoadReport;

/// Columns the survey flow selects, by CSV header name
pub const SURVEY_COLUMNS: [&str; 8] = [
    "Timestamp",
    "DAILY_STRESS",
    "FLOW",
    "TODO_COMPLETED",
    "SLEEP_HOURS",
    "GENDER",
    "AGE",
    "WORK_LIFE_BALANCE_SCORE",
];

/// Loads the survey table from a CSV file
pub fn load_survey_csv(path: &Path) -> Result<(Vec<SurveyRecord>, LoadReport), PipelineError> {
    let text = fs::read_to_string(path)?;
    parse_survey_csv(&text)
}

/// Parses survey CSV text into records, dropping incomplete rows
pub fn parse_survey_csv(text: &str) -> Result<(Vec<SurveyRecord>, LoadReport), PipelineError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| PipelineError::EmptySource("survey CSV has no header".to_string()))?;

    let names = split_csv_line(header);
    let mut indices = [0usize; SURVEY_COLUMNS.len()];
    for (slot, wanted) in indices.iter_mut().zip(SURVEY_COLUMNS.iter()) {
        *slot = names
            .iter()
            .position(|n| n == wanted)
            .ok_or_else(|| PipelineError::MissingColumn((*wanted).to_string()))?;
    }

    let mut report = LoadReport {
        files_loaded: 1,
        ..LoadReport::default()
    };
    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        match record_from_fields(&fields, &indices) {
            Some(record) => {
                records.push(record);
                report.events_loaded += 1;
            }
            None => report.events_dropped += 1,
        }
    }

    if records.is_empty() {
        return Err(PipelineError::EmptySource(
            "survey CSV has no usable rows".to_string(),
        ));
    }

    Ok((records, report))
}

fn record_from_fields(fields: &[String], indices: &[usize; 8]) -> Option<SurveyRecord> {
    let field = |i: usize| -> Option<&str> {
        let value = fields.get(indices[i])?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    };
    let numeric = |i: usize| -> Option<f64> { field(i)?.parse::<f64>().ok() };

    Some(SurveyRecord {
        timestamp: field(0)?.to_string(),
        daily_stress: numeric(1)?,
        flow: numeric(2)?,
        todo_completed: numeric(3)?,
        sleep_hours: numeric(4)?,
        gender: field(5)?.to_string(),
        age: field(6)?.to_string(),
        work_life_balance: numeric(7)?,
    })
}

/// Splits one CSV line, honoring double-quoted fields with embedded commas
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Timestamp,DAILY_STRESS,FLOW,TODO_COMPLETED,SLEEP_HOURS,GENDER,AGE,WORK_LIFE_BALANCE_SCORE,EXTRA
7/7/15 17:00,3,2,5,7,Female,36 to 50,612.6,ignored
7/7/15 18:30,2,4,3,8,Male,21 to 35,668.9,ignored
7/8/15 09:10,,4,3,8,Male,21 to 35,610.0,ignored
7/8/15 10:45,abc,4,3,8,Male,21 to 35,610.0,ignored
";

    #[test]
    fn selects_columns_and_drops_incomplete_rows() {
        let (records, report) = parse_survey_csv(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.events_loaded, 2);
        assert_eq!(report.events_dropped, 2);

        assert_eq!(
            records[0],
            SurveyRecord {
                timestamp: "7/7/15 17:00".to_string(),
                daily_stress: 3.0,
                flow: 2.0,
                todo_completed: 5.0,
                sleep_hours: 7.0,
                gender: "Female".to_string(),
                age: "36 to 50".to_string(),
                work_life_balance: 612.6,
            }
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let text = "Timestamp,DAILY_STRESS\n7/7/15,3\n";
        match parse_survey_csv(text) {
            Err(PipelineError::MissingColumn(col)) => assert_eq!(col, "FLOW"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let fields = split_csv_line(r#"a,"b, c",d"#);
        assert_eq!(fields, vec!["a", "b, c", "d"]);
    }

    #[test]
    fn no_usable_rows_is_an_error() {
        let text = "Timestamp,DAILY_STRESS,FLOW,TODO_COMPLETED,SLEEP_HOURS,GENDER,AGE,WORK_LIFE_BALANCE_SCORE\n";
        assert!(matches!(
            parse_survey_csv(text),
            Err(PipelineError::EmptySource(_))
        ));
    }
}
