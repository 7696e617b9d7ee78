//! Mood feature builder
//!
//! Turns raw mood events into the base feature table: the composite mood
//! score, its rolling means (windows 3 and 7), the first-difference trend,
//! and the time/location context of each report.

use chrono::{Datelike, Timelike};

use crate::types::{MoodEvent, MoodFeatures};

use super::rolling::{first_difference, rolling_mean, user_runs};

/// Compute the composite mood score in [0, 1] from the happy/sad sub-scores
///
/// `((happy / 4) - (sad / 4) + 1) / 2`; higher is better. Both sub-scores
/// are required. Input past the 0-4 prompt range clamps rather than
/// escaping the bound.
pub fn compute_mood_score(happy: Option<f64>, sad: Option<f64>) -> Option<f64> {
    match (happy, sad) {
        (Some(h), Some(s)) => Some((((h / 4.0) - (s / 4.0) + 1.0) / 2.0).clamp(0.0, 1.0)),
        _ => None,
    }
}

/// Day of week with Monday = 0, Sunday = 6
pub fn day_of_week(ts: &chrono::DateTime<chrono::Utc>) -> u32 {
    ts.weekday().num_days_from_monday()
}

/// Builds the mood feature table
///
/// Events without both sub-scores cannot anchor a training row and are
/// dropped. The remainder is sorted by (user, time) and the window
/// features run once per user.
pub fn build_mood_features(events: &[MoodEvent]) -> Vec<MoodFeatures> {
    let mut scored: Vec<(&MoodEvent, f64)> = events
        .iter()
        .filter_map(|e| compute_mood_score(e.happy, e.sad).map(|score| (e, score)))
        .collect();
    scored.sort_by(|(a, _), (b, _)| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let mut rows: Vec<MoodFeatures> = scored
        .iter()
        .map(|(event, score)| {
            let dow = day_of_week(&event.timestamp);
            MoodFeatures {
                user_id: event.user_id.clone(),
                timestamp: event.timestamp,
                mood_score: *score,
                mood_3day_avg: None,
                mood_7day_avg: None,
                mood_trend: None,
                hour: event.timestamp.hour(),
                day_of_week: dow,
                is_weekend: dow >= 5,
                has_location: event.location.has_fix,
                latitude: event.location.latitude,
                longitude: event.location.longitude,
            }
        })
        .collect();

    let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    for (start, end) in user_runs(&ids) {
        let scores: Vec<f64> = rows[start..end].iter().map(|r| r.mood_score).collect();
        let avg3 = rolling_mean(&scores, 3);
        let avg7 = rolling_mean(&scores, 7);
        let trend = first_difference(&scores);
        for (i, row) in rows[start..end].iter_mut().enumerate() {
            row.mood_3day_avg = avg3[i];
            row.mood_7day_avg = avg7[i];
            row.mood_trend = trend[i];
        }
    }

    rows
}
