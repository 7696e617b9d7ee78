//! Rolling-window statistics over per-user series
//!
//! The training tables treat a window as defined only once it is full: the
//! first `window - 1` positions of a rolling mean and the first position of
//! a trend are absent, not zero. Absence is carried as `None` here and only
//! becomes 0.0 at matrix assembly.

use std::collections::VecDeque;

/// Rolling mean over the trailing `window` observations
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let mut buf: VecDeque<f64> = VecDeque::with_capacity(window + 1);
    for &v in values {
        buf.push_back(v);
        if buf.len() > window {
            buf.pop_front();
        }
        if buf.len() == window {
            out.push(Some(buf.iter().sum::<f64>() / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// First difference (current minus previous); the first position is absent
pub fn first_difference(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| if i == 0 { None } else { Some(v - values[i - 1]) })
        .collect()
}

/// Half-open index ranges of contiguous equal user ids in a sorted slice
///
/// Rolling state must never leak across users; builders sort by
/// (user, time) and then run the window functions one range at a time.
pub fn user_runs(user_ids: &[&str]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=user_ids.len() {
        if i == user_ids.len() || user_ids[i] != user_ids[start] {
            runs.push((start, i));
            start = i;
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rolling_mean_leaves_leading_rows_absent() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let means = rolling_mean(&values, 3);
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn rolling_mean_window_larger_than_series() {
        let values = [1.0, 2.0];
        assert_eq!(rolling_mean(&values, 7), vec![None, None]);
    }

    #[test]
    fn rolling_mean_window_one_is_identity() {
        let values = [0.25, 0.5];
        assert_eq!(rolling_mean(&values, 1), vec![Some(0.25), Some(0.5)]);
    }

    #[test]
    fn first_difference_starts_absent() {
        let values = [0.5, 0.7, 0.4];
        let diffs = first_difference(&values);
        assert_eq!(diffs[0], None);
        assert_eq!(diffs[1], Some(0.7 - 0.5));
        assert_eq!(diffs[2], Some(0.4 - 0.7));
    }

    #[test]
    fn user_runs_split_contiguous_ids() {
        let ids = ["u00", "u00", "u01", "u01", "u01", "u02"];
        assert_eq!(user_runs(&ids), vec![(0, 2), (2, 5), (5, 6)]);
        assert_eq!(user_runs(&[]), Vec::<(usize, usize)>::new());
    }
}
