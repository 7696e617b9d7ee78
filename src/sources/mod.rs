//! Raw source loaders
//!
//! This module reads the per-user JSON logs (mood, activity, sleep) and the
//! lifestyle survey CSV, and maps them to the canonical event types. One JSON
//! file per user, with the user id encoded in the file name
//! (`Mood_u00.json` -> `u00`).

mod activity;
mod mood;
mod sleep;
pub mod survey;

pub use activity::ActivityLoader;
pub use mood::MoodLoader;
pub use sleep::SleepLoader;
pub use survey::load_survey_csv;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::GeoFix;

/// Trait for per-user log loaders
pub trait SourceLoader {
    type Event;

    /// File name prefix this loader consumes ("Mood", "Activity", "Sleep")
    fn file_prefix(&self) -> &'static str;

    /// Parse one user's raw JSON log into canonical events
    fn parse(&self, raw_json: &str, user_id: &str) -> Result<ParsedLog<Self::Event>, PipelineError>;
}

/// Events parsed from one file plus the count of entries dropped on the way
#[derive(Debug)]
pub struct ParsedLog<T> {
    pub events: Vec<T>,
    pub dropped: usize,
}

/// Counters describing how a load went
///
/// Raw logs are messy: empty files, events without usable timestamps,
/// numeric fields encoded as strings. None of that is fatal; it is counted
/// here so training reports can show what was kept and what was not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Files parsed into at least zero events
    pub files_loaded: usize,
    /// Files containing an empty JSON array
    pub files_empty: usize,
    /// Files skipped: unreadable, unparseable, or no user id in the name
    pub files_skipped: usize,
    /// Events kept after conversion
    pub events_loaded: usize,
    /// Events dropped for missing timestamps or required fields
    pub events_dropped: usize,
}

/// A raw scalar that may arrive as a JSON number or a numeric string
///
/// Survey-style logs are inconsistent about types; `as_f64` applies the
/// usual coercion and anything unparseable becomes absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Integer(i64),
    Text(String),
}

impl RawValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Integer(i) => Some(*i as f64),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Parses a raw location field into a geographic fix
///
/// `"Unknown"`, `"null"`, empty, or absent values mean no fix. A
/// `"lat,lon"` pair yields both coordinates; a bare number is kept as a
/// latitude-only fix, matching how the logs were recorded.
pub fn parse_location(raw: Option<&RawValue>) -> GeoFix {
    let raw = match raw {
        Some(r) => r,
        None => return GeoFix::unknown(),
    };

    match raw {
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s == "Unknown" || s == "null" {
                return GeoFix::unknown();
            }
            let mut parts = s.splitn(2, ',');
            let latitude = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
            let longitude = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
            match latitude {
                Some(_) => GeoFix {
                    has_fix: true,
                    latitude,
                    longitude,
                },
                None => GeoFix::unknown(),
            }
        }
        other => match other.as_f64() {
            Some(lat) => GeoFix {
                has_fix: true,
                latitude: Some(lat),
                longitude: None,
            },
            None => GeoFix::unknown(),
        },
    }
}

/// Extracts the user id from a log file name (`Mood_u00.json` -> `u00`)
pub fn user_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let uid = stem.split('_').nth(1)?;
    if uid.is_empty() {
        None
    } else {
        Some(uid.to_string())
    }
}

/// Loads every `<prefix>_<uid>.json` file under `dir` with the given loader
///
/// Files are visited in name order so repeated runs produce identical event
/// ordering. Unreadable or unparseable files are skipped and counted, not
/// raised; an empty directory is an error because every downstream stage
/// needs at least one event.
pub fn load_source_dir<L: SourceLoader>(
    loader: &L,
    dir: &Path,
) -> Result<(Vec<L::Event>, LoadReport), PipelineError> {
    let mut report = LoadReport::default();
    let mut events = Vec::new();

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(loader.file_prefix()))
        })
        .collect();
    paths.sort();

    for path in paths {
        let user_id = match user_id_from_path(&path) {
            Some(uid) => uid,
            None => {
                report.files_skipped += 1;
                continue;
            }
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                report.files_skipped += 1;
                continue;
            }
        };

        match loader.parse(&raw, &user_id) {
            Ok(parsed) => {
                report.events_dropped += parsed.dropped;
                if parsed.events.is_empty() && parsed.dropped == 0 {
                    report.files_empty += 1;
                } else {
                    report.files_loaded += 1;
                    report.events_loaded += parsed.events.len();
                    events.extend(parsed.events);
                }
            }
            Err(_) => {
                report.files_skipped += 1;
            }
        }
    }

    if events.is_empty() {
        return Err(PipelineError::EmptySource(format!(
            "no {} events under {}",
            loader.file_prefix(),
            dir.display()
        )));
    }

    Ok((events, report))
}

/// Converts a Unix-seconds value into a UTC timestamp
pub(crate) fn timestamp_from_unix(raw: Option<&RawValue>) -> Option<chrono::DateTime<chrono::Utc>> {
    let secs = raw?.as_f64()?;
    if !secs.is_finite() {
        return None;
    }
    chrono::DateTime::from_timestamp(secs as i64, 0)
}
