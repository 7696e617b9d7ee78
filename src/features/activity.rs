//! Activity feature builder
//!
//! Presence flags say whether a kind of activity was reported at all;
//! intensity scores carry how strongly, with absent readings treated as
//! zero. The composite is the mean of the three intensities.

use crate::types::{ActivityEvent, ActivityFeatures};

use super::rolling::{first_difference, rolling_mean, user_runs};

/// Mean of the social/work/relax intensities, absent readings as zero
pub fn compute_total_activity_score(
    social: Option<f64>,
    working: Option<f64>,
    relaxing: Option<f64>,
) -> f64 {
    (social.unwrap_or(0.0) + working.unwrap_or(0.0) + relaxing.unwrap_or(0.0)) / 3.0
}

/// Builds the activity feature table
pub fn build_activity_features(events: &[ActivityEvent]) -> Vec<ActivityFeatures> {
    let mut sorted: Vec<&ActivityEvent> = events.iter().collect();
    sorted.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let mut rows: Vec<ActivityFeatures> = sorted
        .iter()
        .map(|event| ActivityFeatures {
            user_id: event.user_id.clone(),
            timestamp: event.timestamp,
            is_social: event.social.is_some(),
            is_working: event.working.is_some(),
            is_relaxing: event.relaxing.is_some(),
            social_intensity: event.social.unwrap_or(0.0),
            work_intensity: event.working.unwrap_or(0.0),
            relax_intensity: event.relaxing.unwrap_or(0.0),
            total_activity_score: compute_total_activity_score(
                event.social,
                event.working,
                event.relaxing,
            ),
            activity_3day_avg: None,
            activity_7day_avg: None,
            activity_trend: None,
        })
        .collect();

    let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    for (start, end) in user_runs(&ids) {
        let totals: Vec<f64> = rows[start..end]
            .iter()
            .map(|r| r.total_activity_score)
            .collect();
        let avg3 = rolling_mean(&totals, 3);
        let avg7 = rolling_mean(&totals, 7);
        let trend = first_difference(&totals);
        for (i, row) in rows[start..end].iter_mut().enumerate() {
            row.activity_3day_avg = avg3[i];
            row.activity_7day_avg = avg7[i];
            row.activity_trend = trend[i];
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoFix;
    use chrono::DateTime;

    fn event(user: &str, secs: i64, social: Option<f64>, working: Option<f64>) -> ActivityEvent {
        ActivityEvent {
            user_id: user.to_string(),
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            social,
            working,
            relaxing: None,
            other_working: None,
            other_relaxing: None,
            location: GeoFix::unknown(),
        }
    }

    #[test]
    fn total_score_averages_three_intensities() {
        assert_eq!(
            compute_total_activity_score(Some(2.0), Some(1.0), Some(3.0)),
            2.0
        );
        assert_eq!(compute_total_activity_score(Some(3.0), None, None), 1.0);
        assert_eq!(compute_total_activity_score(None, None, None), 0.0);
    }

    #[test]
    fn presence_flags_track_reported_fields() {
        let rows = build_activity_features(&[event("u00", 1_364_356_800, Some(2.0), None)]);
        assert!(rows[0].is_social);
        assert!(!rows[0].is_working);
        assert!(!rows[0].is_relaxing);
        assert_eq!(rows[0].social_intensity, 2.0);
        assert_eq!(rows[0].work_intensity, 0.0);
    }

    #[test]
    fn trend_needs_a_predecessor() {
        const DAY: i64 = 86_400;
        let rows = build_activity_features(&[
            event("u00", 1_364_356_800, Some(3.0), None),
            event("u00", 1_364_356_800 + DAY, Some(0.0), None),
        ]);
        assert_eq!(rows[0].activity_trend, None);
        assert_eq!(rows[1].activity_trend, Some(-1.0));
    }
}
