//! Temporal merge of the per-source feature tables
//!
//! One row per mood report, carrying the nearest-in-time activity and sleep
//! rows for the same user. Matching is by absolute time distance with no
//! default bound; `MergeOptions::max_gap` fences that when sparse users
//! would otherwise pair with far-apart context.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::types::{ActivityFeatures, MergedRow, MoodFeatures, SleepFeatures};

/// Options controlling the nearest-in-time merge
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Maximum distance a matched row may sit from the base row;
    /// unbounded when `None`
    pub max_gap: Option<Duration>,
}

/// Merges the three feature tables into one row per mood report
///
/// Nearest by absolute time distance per user; an exact tie prefers the
/// earlier row. Users absent from a secondary table contribute no context,
/// never an error. The merge is a pure function of its inputs: re-running
/// it on unchanged tables yields identical rows. Output is ordered by
/// (time, user). Labels are attached separately by
/// [`attach_improvement_labels`].
pub fn merge_nearest(
    mood: &[MoodFeatures],
    activity: &[ActivityFeatures],
    sleep: &[SleepFeatures],
    options: &MergeOptions,
) -> Vec<MergedRow> {
    let activity_index = index_by_user(activity, |r| (r.user_id.as_str(), r.timestamp));
    let sleep_index = index_by_user(sleep, |r| (r.user_id.as_str(), r.timestamp));

    let mut rows: Vec<MergedRow> = mood
        .iter()
        .map(|base| MergedRow {
            mood: base.clone(),
            activity: nearest(
                activity_index.get(base.user_id.as_str()),
                base.timestamp,
                |r| r.timestamp,
                options.max_gap,
            )
            .cloned(),
            sleep: nearest(
                sleep_index.get(base.user_id.as_str()),
                base.timestamp,
                |r| r.timestamp,
                options.max_gap,
            )
            .cloned(),
            next_mood_score: None,
            mood_improvement: None,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.mood
            .timestamp
            .cmp(&b.mood.timestamp)
            .then_with(|| a.mood.user_id.cmp(&b.mood.user_id))
    });
    rows
}

/// Attaches the next-period label to every merged row
///
/// Within each user's time-ordered rows, `next_mood_score` is the following
/// row's mood score and `mood_improvement` the difference to it. The last
/// row of each user has no successor and keeps both absent; matrix assembly
/// zero-fills the label there.
pub fn attach_improvement_labels(rows: &mut [MergedRow]) {
    let mut per_user: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        per_user
            .entry(row.mood.user_id.clone())
            .or_default()
            .push(i);
    }

    for indices in per_user.values() {
        for pair in indices.windows(2) {
            let next_score = rows[pair[1]].mood.mood_score;
            let row = &mut rows[pair[0]];
            row.next_mood_score = Some(next_score);
            row.mood_improvement = Some(next_score - row.mood.mood_score);
        }
    }
}

fn index_by_user<'a, T, F>(rows: &'a [T], key: F) -> HashMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> (&'a str, DateTime<Utc>),
{
    let mut index: HashMap<&str, Vec<&T>> = HashMap::new();
    for row in rows {
        let (user, _) = key(row);
        index.entry(user).or_default().push(row);
    }
    for bucket in index.values_mut() {
        bucket.sort_by_key(|&r| key(r).1);
    }
    index
}

fn nearest<'a, T, F>(
    candidates: Option<&Vec<&'a T>>,
    target: DateTime<Utc>,
    ts: F,
    max_gap: Option<Duration>,
) -> Option<&'a T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let candidates = candidates?;
    if candidates.is_empty() {
        return None;
    }

    // First candidate strictly after the target; its predecessor is the
    // last one at or before it.
    let split = candidates.partition_point(|&r| ts(r) <= target);
    let before = split.checked_sub(1).map(|i| candidates[i]);
    let after = candidates.get(split).copied();

    let chosen = match (before, after) {
        (Some(b), Some(a)) => {
            // Tie prefers the earlier row
            if target - ts(b) <= ts(a) - target {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    if let Some(gap) = max_gap {
        let distance = (target - ts(chosen)).abs();
        if distance > gap {
            return None;
        }
    }
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{build_activity_features, build_mood_features, build_sleep_features};
    use crate::types::{ActivityEvent, GeoFix, MoodEvent, SleepEvent};
    use pretty_assertions::assert_eq;

    const BASE: i64 = 1_364_356_800;
    const HOUR: i64 = 3_600;
    const DAY: i64 = 86_400;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn mood_event(user: &str, secs: i64, happy: f64, sad: f64) -> MoodEvent {
        MoodEvent {
            user_id: user.to_string(),
            timestamp: ts(secs),
            happy: Some(happy),
            sad: Some(sad),
            happy_or_not: None,
            sad_or_not: None,
            location: GeoFix::unknown(),
        }
    }

    fn activity_event(user: &str, secs: i64, social: f64) -> ActivityEvent {
        ActivityEvent {
            user_id: user.to_string(),
            timestamp: ts(secs),
            social: Some(social),
            working: None,
            relaxing: None,
            other_working: None,
            other_relaxing: None,
            location: GeoFix::unknown(),
        }
    }

    fn sleep_event(user: &str, secs: i64, hours: f64) -> SleepEvent {
        SleepEvent {
            user_id: user.to_string(),
            timestamp: ts(secs),
            hours: Some(hours),
            rate: Some(3.0),
            social: None,
            location: GeoFix::unknown(),
        }
    }

    #[test]
    fn attaches_the_nearest_row_per_user() {
        let mood = build_mood_features(&[mood_event("u00", BASE + 10 * HOUR, 3.0, 1.0)]);
        let activity = build_activity_features(&[
            activity_event("u00", BASE, 1.0),
            activity_event("u00", BASE + 9 * HOUR, 2.0),
            activity_event("u00", BASE + 20 * HOUR, 3.0),
        ]);
        let sleep = build_sleep_features(&[sleep_event("u00", BASE + 11 * HOUR, 7.0)]);

        let rows = merge_nearest(&mood, &activity, &sleep, &MergeOptions::default());
        assert_eq!(rows.len(), 1);
        let activity = rows[0].activity.as_ref().unwrap();
        assert_eq!(activity.timestamp, ts(BASE + 9 * HOUR));
        assert_eq!(rows[0].sleep.as_ref().unwrap().sleep_duration, 7.0);
    }

    #[test]
    fn exact_tie_prefers_the_earlier_row() {
        let mood = build_mood_features(&[mood_event("u00", BASE + 2 * HOUR, 3.0, 1.0)]);
        let activity = build_activity_features(&[
            activity_event("u00", BASE + HOUR, 1.0),
            activity_event("u00", BASE + 3 * HOUR, 2.0),
        ]);

        let rows = merge_nearest(&mood, &activity, &[], &MergeOptions::default());
        let matched = rows[0].activity.as_ref().unwrap();
        assert_eq!(matched.timestamp, ts(BASE + HOUR));
    }

    #[test]
    fn users_never_borrow_context_from_each_other() {
        let mood = build_mood_features(&[mood_event("u00", BASE, 3.0, 1.0)]);
        let activity = build_activity_features(&[activity_event("u01", BASE, 4.0)]);

        let rows = merge_nearest(&mood, &activity, &[], &MergeOptions::default());
        assert_eq!(rows[0].activity, None);
        assert_eq!(rows[0].sleep, None);
    }

    #[test]
    fn max_gap_fences_far_matches() {
        let mood = build_mood_features(&[mood_event("u00", BASE, 3.0, 1.0)]);
        let activity = build_activity_features(&[activity_event("u00", BASE + 3 * DAY, 4.0)]);

        let unbounded = merge_nearest(&mood, &activity, &[], &MergeOptions::default());
        assert!(unbounded[0].activity.is_some());

        let bounded = merge_nearest(
            &mood,
            &activity,
            &[],
            &MergeOptions {
                max_gap: Some(Duration::days(1)),
            },
        );
        assert_eq!(bounded[0].activity, None);
    }

    #[test]
    fn merge_is_idempotent_over_unchanged_tables() {
        let mood = build_mood_features(&[
            mood_event("u00", BASE, 3.0, 1.0),
            mood_event("u00", BASE + DAY, 2.0, 2.0),
            mood_event("u01", BASE + 2 * HOUR, 4.0, 0.0),
        ]);
        let activity = build_activity_features(&[
            activity_event("u00", BASE + HOUR, 1.0),
            activity_event("u01", BASE + HOUR, 2.0),
        ]);
        let sleep = build_sleep_features(&[sleep_event("u00", BASE - 2 * HOUR, 6.0)]);

        let first = merge_nearest(&mood, &activity, &sleep, &MergeOptions::default());
        let second = merge_nearest(&mood, &activity, &sleep, &MergeOptions::default());
        assert_eq!(first.len(), second.len());
        assert_eq!(first, second);
    }

    #[test]
    fn labels_follow_each_user_in_time_order() {
        let mood = build_mood_features(&[
            mood_event("u00", BASE, 2.0, 2.0),          // score 0.5
            mood_event("u00", BASE + DAY, 4.0, 0.0),    // score 1.0
            mood_event("u00", BASE + 2 * DAY, 0.0, 4.0) // score 0.0
        ]);
        let mut rows = merge_nearest(&mood, &[], &[], &MergeOptions::default());
        attach_improvement_labels(&mut rows);

        assert_eq!(rows[0].next_mood_score, Some(1.0));
        assert_eq!(rows[0].mood_improvement, Some(0.5));
        assert_eq!(rows[1].mood_improvement, Some(-1.0));
        assert_eq!(rows[2].next_mood_score, None);
        assert_eq!(rows[2].mood_improvement, None);
    }
}
