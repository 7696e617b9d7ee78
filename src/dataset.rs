//! Training table assembly for the fusion flow
//!
//! Flattens merged rows into the fixed numeric matrix the delta model is
//! fit on. Column order is part of the artifact contract: a persisted model
//! only makes sense against the exact schema it was trained with. Absent
//! values (leading windows, missing context, unlabeled final rows) become
//! 0.0 here and nowhere earlier.

use crate::types::MergedRow;

/// Fusion feature columns, in matrix order
pub const FUSION_FEATURES: [&str; 29] = [
    "mood_score",
    "mood_3day_avg",
    "mood_7day_avg",
    "mood_trend",
    "total_activity_score",
    "social_intensity",
    "work_intensity",
    "relax_intensity",
    "is_social",
    "is_working",
    "is_relaxing",
    "activity_3day_avg",
    "activity_7day_avg",
    "activity_trend",
    "sleep_quality",
    "sleep_duration",
    "is_short_sleep",
    "is_long_sleep",
    "is_good_sleep",
    "sleep_quality_3day_avg",
    "sleep_duration_3day_avg",
    "sleep_quality_trend",
    "sleep_duration_trend",
    "hour",
    "day_of_week",
    "is_weekend",
    "has_location",
    "latitude",
    "longitude",
];

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// One merged row as a numeric feature vector in [`FUSION_FEATURES`] order
pub fn feature_row(row: &MergedRow) -> Vec<f64> {
    let mood = &row.mood;
    let activity = row.activity.as_ref();
    let sleep = row.sleep.as_ref();

    vec![
        mood.mood_score,
        mood.mood_3day_avg.unwrap_or(0.0),
        mood.mood_7day_avg.unwrap_or(0.0),
        mood.mood_trend.unwrap_or(0.0),
        activity.map_or(0.0, |a| a.total_activity_score),
        activity.map_or(0.0, |a| a.social_intensity),
        activity.map_or(0.0, |a| a.work_intensity),
        activity.map_or(0.0, |a| a.relax_intensity),
        activity.map_or(0.0, |a| flag(a.is_social)),
        activity.map_or(0.0, |a| flag(a.is_working)),
        activity.map_or(0.0, |a| flag(a.is_relaxing)),
        activity.and_then(|a| a.activity_3day_avg).unwrap_or(0.0),
        activity.and_then(|a| a.activity_7day_avg).unwrap_or(0.0),
        activity.and_then(|a| a.activity_trend).unwrap_or(0.0),
        sleep.map_or(0.0, |s| s.sleep_quality),
        sleep.map_or(0.0, |s| s.sleep_duration),
        sleep.map_or(0.0, |s| flag(s.is_short_sleep)),
        sleep.map_or(0.0, |s| flag(s.is_long_sleep)),
        sleep.map_or(0.0, |s| flag(s.is_good_sleep)),
        sleep.and_then(|s| s.sleep_quality_3day_avg).unwrap_or(0.0),
        sleep.and_then(|s| s.sleep_duration_3day_avg).unwrap_or(0.0),
        sleep.and_then(|s| s.sleep_quality_trend).unwrap_or(0.0),
        sleep.and_then(|s| s.sleep_duration_trend).unwrap_or(0.0),
        f64::from(mood.hour),
        f64::from(mood.day_of_week),
        flag(mood.is_weekend),
        flag(mood.has_location),
        mood.latitude.unwrap_or(0.0),
        mood.longitude.unwrap_or(0.0),
    ]
}

/// The full feature matrix, one vector per merged row
pub fn feature_matrix(rows: &[MergedRow]) -> Vec<Vec<f64>> {
    rows.iter().map(feature_row).collect()
}

/// Labels for the merged rows; rows without a successor are zero-filled
pub fn improvement_labels(rows: &[MergedRow]) -> Vec<f64> {
    rows.iter()
        .map(|r| r.mood_improvement.unwrap_or(0.0))
        .collect()
}
