//! Core types for the moodcast pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: canonical events, per-source feature rows, merged training rows,
//! and the survey table used by the served model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source identifier for provenance tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Mood,
    Activity,
    Sleep,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Mood => "mood",
            EventSource::Activity => "activity",
            EventSource::Sleep => "sleep",
        }
    }
}

/// Geographic fix parsed from a raw location field
///
/// Raw logs carry locations as `"lat,lon"` strings, the literals
/// `"Unknown"`/`"null"`, or occasionally a bare number. Anything that is not
/// a usable fix collapses to `has_fix = false` rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub has_fix: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoFix {
    pub fn unknown() -> Self {
        Self {
            has_fix: false,
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for GeoFix {
    fn default() -> Self {
        Self::unknown()
    }
}

/// A single mood self-report, one per EMA response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEvent {
    /// User the report belongs to (taken from the file name)
    pub user_id: String,
    /// Response time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Happiness sub-score (0-4)
    pub happy: Option<f64>,
    /// Sadness sub-score (0-4)
    pub sad: Option<f64>,
    /// Binary happy indicator, when the prompt asked for one
    pub happy_or_not: Option<f64>,
    /// Binary sad indicator, when the prompt asked for one
    pub sad_or_not: Option<f64>,
    /// Location at response time
    pub location: GeoFix,
}

/// A single activity self-report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// User the report belongs to (taken from the file name)
    pub user_id: String,
    /// Response time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Social activity intensity
    pub social: Option<f64>,
    /// Working intensity
    pub working: Option<f64>,
    /// Relaxing intensity
    pub relaxing: Option<f64>,
    /// Free-form working intensity
    pub other_working: Option<f64>,
    /// Free-form relaxing intensity
    pub other_relaxing: Option<f64>,
    /// Location at response time
    pub location: GeoFix,
}

/// A single sleep self-report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEvent {
    /// User the report belongs to (taken from the file name)
    pub user_id: String,
    /// Response time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Hours slept
    pub hours: Option<f64>,
    /// Self-rated sleep quality (1-4)
    pub rate: Option<f64>,
    /// Social context indicator
    pub social: Option<f64>,
    /// Location at response time
    pub location: GeoFix,
}

/// Mood feature row keyed by (user, time)
///
/// Rolling and trend fields are `None` for leading rows that do not yet have
/// a full window or a predecessor; that is expected, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodFeatures {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Composite mood score in [0, 1], higher is better
    pub mood_score: f64,
    /// Rolling mean of mood_score, window 3
    pub mood_3day_avg: Option<f64>,
    /// Rolling mean of mood_score, window 7
    pub mood_7day_avg: Option<f64>,
    /// First difference of mood_score
    pub mood_trend: Option<f64>,
    /// Hour of day (UTC, 0-23)
    pub hour: u32,
    /// Day of week (Monday = 0)
    pub day_of_week: u32,
    /// Saturday or Sunday
    pub is_weekend: bool,
    /// Location at the report
    pub has_location: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Activity feature row keyed by (user, time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeatures {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Whether a social intensity was reported at all
    pub is_social: bool,
    pub is_working: bool,
    pub is_relaxing: bool,
    /// Reported intensities, absent treated as zero
    pub social_intensity: f64,
    pub work_intensity: f64,
    pub relax_intensity: f64,
    /// Mean of the three intensities
    pub total_activity_score: f64,
    /// Rolling mean of total_activity_score, window 3
    pub activity_3day_avg: Option<f64>,
    /// Rolling mean of total_activity_score, window 7
    pub activity_7day_avg: Option<f64>,
    /// First difference of total_activity_score
    pub activity_trend: Option<f64>,
}

/// Sleep feature row keyed by (user, time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepFeatures {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Self-rated quality, absent treated as zero
    pub sleep_quality: f64,
    /// Hours slept, absent treated as zero
    pub sleep_duration: f64,
    /// Under six hours
    pub is_short_sleep: bool,
    /// Over eight hours
    pub is_long_sleep: bool,
    /// Quality of three or better
    pub is_good_sleep: bool,
    /// Rolling mean of sleep_quality, window 3
    pub sleep_quality_3day_avg: Option<f64>,
    /// Rolling mean of sleep_duration, window 3
    pub sleep_duration_3day_avg: Option<f64>,
    /// First difference of sleep_quality
    pub sleep_quality_trend: Option<f64>,
    /// First difference of sleep_duration
    pub sleep_duration_trend: Option<f64>,
}

/// One training row: a mood report with its nearest activity and sleep
/// context and the next-period label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub mood: MoodFeatures,
    /// Nearest activity features for the same user, if any
    pub activity: Option<ActivityFeatures>,
    /// Nearest sleep features for the same user, if any
    pub sleep: Option<SleepFeatures>,
    /// Mood score of the user's next report, absent for the last row
    pub next_mood_score: Option<f64>,
    /// Label: next_mood_score - mood_score, absent for the last row
    pub mood_improvement: Option<f64>,
}

/// One row of the lifestyle survey table after incomplete rows are dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    /// Raw submission timestamp, carried for provenance but never a feature
    pub timestamp: String,
    pub daily_stress: f64,
    pub flow: f64,
    pub todo_completed: f64,
    pub sleep_hours: f64,
    pub gender: String,
    pub age: String,
    /// Training target before scaling
    pub work_life_balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_source_as_str() {
        assert_eq!(EventSource::Mood.as_str(), "mood");
        assert_eq!(EventSource::Activity.as_str(), "activity");
        assert_eq!(EventSource::Sleep.as_str(), "sleep");
    }

    #[test]
    fn geo_fix_default_is_unknown() {
        let fix = GeoFix::default();
        assert!(!fix.has_fix);
        assert!(fix.latitude.is_none());
        assert!(fix.longitude.is_none());
    }
}
