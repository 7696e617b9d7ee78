//! Activity log loader
//!
//! Parses per-user activity EMA response files. The raw field names follow
//! the prompt wording (`Social2`, `working`, `relaxing`), kept here and
//! nowhere else.

use serde::Deserialize;

use crate::error::PipelineError;
use crate::types::ActivityEvent;

use super::{parse_location, timestamp_from_unix, ParsedLog, RawValue, SourceLoader};

/// Activity log loader
pub struct ActivityLoader;

impl SourceLoader for ActivityLoader {
    type Event = ActivityEvent;

    fn file_prefix(&self) -> &'static str {
        "Activity"
    }

    fn parse(
        &self,
        raw_json: &str,
        user_id: &str,
    ) -> Result<ParsedLog<ActivityEvent>, PipelineError> {
        let entries: Vec<ActivityEntry> = serde_json::from_str(raw_json)?;
        let mut events = Vec::with_capacity(entries.len());
        let mut dropped = 0;

        for entry in &entries {
            let timestamp = match timestamp_from_unix(entry.resp_time.as_ref()) {
                Some(ts) => ts,
                None => {
                    dropped += 1;
                    continue;
                }
            };

            events.push(ActivityEvent {
                user_id: user_id.to_string(),
                timestamp,
                social: entry.social.as_ref().and_then(RawValue::as_f64),
                working: entry.working.as_ref().and_then(RawValue::as_f64),
                relaxing: entry.relaxing.as_ref().and_then(RawValue::as_f64),
                other_working: entry.other_working.as_ref().and_then(RawValue::as_f64),
                other_relaxing: entry.other_relaxing.as_ref().and_then(RawValue::as_f64),
                location: parse_location(entry.location.as_ref()),
            });
        }

        Ok(ParsedLog { events, dropped })
    }
}

// Raw activity response structure
#[derive(Debug, Deserialize)]
struct ActivityEntry {
    resp_time: Option<RawValue>,
    #[serde(rename = "Social2")]
    social: Option<RawValue>,
    working: Option<RawValue>,
    relaxing: Option<RawValue>,
    other_working: Option<RawValue>,
    other_relaxing: Option<RawValue>,
    location: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_activity_log() {
        let json = r#"[
            {"resp_time": 1364356800, "Social2": 2, "working": "1",
             "location": "null"},
            {"resp_time": 1364443200, "relaxing": 3}
        ]"#;

        let parsed = ActivityLoader.parse(json, "u12").unwrap();
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.dropped, 0);

        let first = &parsed.events[0];
        assert_eq!(first.user_id, "u12");
        assert_eq!(first.social, Some(2.0));
        assert_eq!(first.working, Some(1.0));
        assert_eq!(first.relaxing, None);
        assert!(!first.location.has_fix);

        let second = &parsed.events[1];
        assert_eq!(second.relaxing, Some(3.0));
        assert_eq!(second.social, None);
    }

    #[test]
    fn unparseable_intensity_coerces_to_absent() {
        let json = r#"[{"resp_time": 1364356800, "Social2": "often"}]"#;
        let parsed = ActivityLoader.parse(json, "u12").unwrap();
        assert_eq!(parsed.events[0].social, None);
    }
}
