//! Sleep log loader
//!
//! Parses per-user sleep EMA response files: hours slept and a 1-4
//! self-rating, one entry per morning prompt.

use serde::Deserialize;

use crate::error::PipelineError;
use crate::types::SleepEvent;

use super::{parse_location, timestamp_from_unix, ParsedLog, RawValue, SourceLoader};

/// Sleep log loader
pub struct SleepLoader;

impl SourceLoader for SleepLoader {
    type Event = SleepEvent;

    fn file_prefix(&self) -> &'static str {
        "Sleep"
    }

    fn parse(&self, raw_json: &str, user_id: &str) -> Result<ParsedLog<SleepEvent>, PipelineError> {
        let entries: Vec<SleepEntry> = serde_json::from_str(raw_json)?;
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

            events.push(SleepEvent {
                user_id: user_id.to_string(),
                timestamp,
                hours: entry.hour.as_ref().and_then(RawValue::as_f64),
                rate: entry.rate.as_ref().and_then(RawValue::as_f64),
                social: entry.social.as_ref().and_then(RawValue::as_f64),
                location: parse_location(entry.location.as_ref()),
            });
        }

        Ok(ParsedLog { events, dropped })
    }
}

// Raw sleep response structure; `hour` is hours slept, not a clock hour
#[derive(Debug, Deserialize)]
struct SleepEntry {
    resp_time: Option<RawValue>,
    hour: Option<RawValue>,
    rate: Option<RawValue>,
    social: Option<RawValue>,
    location: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sleep_log() {
        let json = r#"[
            {"resp_time": 1364356800, "hour": 7.5, "rate": "3",
             "location": "38.95,-95.25"},
            {"resp_time": 1364443200, "hour": "5"}
        ]"#;

        let parsed = SleepLoader.parse(json, "u07").unwrap();
        assert_eq!(parsed.events.len(), 2);

        let first = &parsed.events[0];
        assert_eq!(first.user_id, "u07");
        assert_eq!(first.hours, Some(7.5));
        assert_eq!(first.rate, Some(3.0));
        assert!(first.location.has_fix);

        let second = &parsed.events[1];
        assert_eq!(second.hours, Some(5.0));
        assert_eq!(second.rate, None);
    }

    #[test]
    fn missing_resp_time_is_dropped() {
        let json = r#"[{"hour": 8, "rate": 4}]"#;
        let parsed = SleepLoader.parse(json, "u07").unwrap();
        assert!(parsed.events.is_empty());
        assert_eq!(parsed.dropped, 1);
    }
}
