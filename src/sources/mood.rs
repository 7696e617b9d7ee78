//! Mood log loader
//!
//! Parses per-user mood EMA response files and maps them to canonical
//! mood events.

use serde::Deserialize;

use crate::error::PipelineError;
use crate::types::MoodEvent;

use super::{parse_location, timestamp_from_unix, ParsedLog, RawValue, SourceLoader};

/// Mood log loader
pub struct MoodLoader;

impl SourceLoader for MoodLoader {
    type Event = MoodEvent;

    fn file_prefix(&self) -> &'static str {
        "Mood"
    }

    fn parse(&self, raw_json: &str, user_id: &str) -> Result<ParsedLog<MoodEvent>, PipelineError> {
        let entries: Vec<MoodEntry> = serde_json::from_str(raw_json)?;
        let mut events = Vec::with_capacity(entries.len());
        let mut dropped = 0;

        for entry in &entries {
            // An event without a usable response time cannot be placed on
            // the user's timeline.
            let timestamp = match timestamp_from_unix(entry.resp_time.as_ref()) {
                Some(ts) => ts,
                None => {
                    dropped += 1;
                    continue;
                }
            };

            events.push(MoodEvent {
                user_id: user_id.to_string(),
                timestamp,
                happy: entry.happy.as_ref().and_then(RawValue::as_f64),
                sad: entry.sad.as_ref().and_then(RawValue::as_f64),
                happy_or_not: entry.happyornot.as_ref().and_then(RawValue::as_f64),
                sad_or_not: entry.sadornot.as_ref().and_then(RawValue::as_f64),
                location: parse_location(entry.location.as_ref()),
            });
        }

        Ok(ParsedLog { events, dropped })
    }
}

// Raw mood response structure; prompts vary, so every field is optional
#[derive(Debug, Deserialize)]
struct MoodEntry {
    resp_time: Option<RawValue>,
    happy: Option<RawValue>,
    sad: Option<RawValue>,
    happyornot: Option<RawValue>,
    sadornot: Option<RawValue>,
    location: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mood_log() {
        let json = r#"[
            {"resp_time": 1364356800, "happy": 3, "sad": "1",
             "location": "38.9717,-95.2353"},
            {"resp_time": 1364443200, "happy": "2", "sad": 2,
             "happyornot": 1, "location": "Unknown"},
            {"happy": 4, "sad": 0}
        ]"#;

        let parsed = MoodLoader.parse(json, "u00").unwrap();
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.dropped, 1);

        let first = &parsed.events[0];
        assert_eq!(first.user_id, "u00");
        assert_eq!(first.happy, Some(3.0));
        assert_eq!(first.sad, Some(1.0));
        assert!(first.location.has_fix);
        assert_eq!(first.location.latitude, Some(38.9717));

        let second = &parsed.events[1];
        assert_eq!(second.happy, Some(2.0));
        assert_eq!(second.happy_or_not, Some(1.0));
        assert!(!second.location.has_fix);
    }

    #[test]
    fn empty_log_parses_to_no_events() {
        let parsed = MoodLoader.parse("[]", "u00").unwrap();
        assert!(parsed.events.is_empty());
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(MoodLoader.parse("not json", "u00").is_err());
    }
}
