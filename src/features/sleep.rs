//! Sleep feature builder
//!
//! Quality is the 1-4 self-rating, duration the reported hours; both fall
//! back to zero when the prompt was skipped. The pattern flags cut at the
//! usual thresholds: short under six hours, long over eight, good at a
//! rating of three or better.

use crate::types::{SleepEvent, SleepFeatures};

use super::rolling::{first_difference, rolling_mean, user_runs};

/// Under six hours of sleep
pub fn is_short_sleep(duration_hours: f64) -> bool {
    duration_hours < 6.0
}

/// Over eight hours of sleep
pub fn is_long_sleep(duration_hours: f64) -> bool {
    duration_hours > 8.0
}

/// Self-rating of three or better
pub fn is_good_sleep(quality: f64) -> bool {
    quality >= 3.0
}

/// Builds the sleep feature table
pub fn build_sleep_features(events: &[SleepEvent]) -> Vec<SleepFeatures> {
    let mut sorted: Vec<&SleepEvent> = events.iter().collect();
    sorted.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let mut rows: Vec<SleepFeatures> = sorted
        .iter()
        .map(|event| {
            let quality = event.rate.unwrap_or(0.0);
            let duration = event.hours.unwrap_or(0.0);
            SleepFeatures {
                user_id: event.user_id.clone(),
                timestamp: event.timestamp,
                sleep_quality: quality,
                sleep_duration: duration,
                is_short_sleep: is_short_sleep(duration),
                is_long_sleep: is_long_sleep(duration),
                is_good_sleep: is_good_sleep(quality),
                sleep_quality_3day_avg: None,
                sleep_duration_3day_avg: None,
                sleep_quality_trend: None,
                sleep_duration_trend: None,
            }
        })
        .collect();

    let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    for (start, end) in user_runs(&ids) {
        let quality: Vec<f64> = rows[start..end].iter().map(|r| r.sleep_quality).collect();
        let duration: Vec<f64> = rows[start..end].iter().map(|r| r.sleep_duration).collect();
        let quality_avg = rolling_mean(&quality, 3);
        let duration_avg = rolling_mean(&duration, 3);
        let quality_trend = first_difference(&quality);
        let duration_trend = first_difference(&duration);
        for (i, row) in rows[start..end].iter_mut().enumerate() {
            row.sleep_quality_3day_avg = quality_avg[i];
            row.sleep_duration_3day_avg = duration_avg[i];
            row.sleep_quality_trend = quality_trend[i];
            row.sleep_duration_trend = duration_trend[i];
        }
    }

    rows
}
