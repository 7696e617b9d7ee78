//! Feature and target scalers
//!
//! `StandardScaler` z-scores each numeric column against the statistics
//! seen at fit time; `MinMaxScaler` maps the training target onto [0, 1]
//! and back. Both are plain serializable state so fitted values survive a
//! round-trip through the artifact files unchanged.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Per-column z-score standardizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fits column means and population standard deviations
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let first = rows
            .first()
            .ok_or_else(|| PipelineError::DegenerateFit("no rows to standardize".to_string()))?;
        let width = first.len();

        let mut means = vec![0.0; width];
        for row in rows {
            if row.len() != width {
                return Err(PipelineError::DimensionMismatch(format!(
                    "expected {} numeric columns, found {}",
                    width,
                    row.len()
                )));
            }
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = rows.len() as f64;
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }

        Ok(Self { means, stds })
    }

    /// Standardizes one row; constant columns shift without scaling
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if row.len() != self.means.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "expected {} numeric columns, found {}",
                self.means.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (m, s))| if *s > 0.0 { (v - m) / s } else { v - m })
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PipelineError> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Min-max mapping of a single value range onto [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: f64,
    pub data_max: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::DegenerateFit(
                "no values to scale".to_string(),
            ));
        }
        let mut data_min = f64::INFINITY;
        let mut data_max = f64::NEG_INFINITY;
        for &v in values {
            data_min = data_min.min(v);
            data_max = data_max.max(v);
        }
        Ok(Self { data_min, data_max })
    }

    /// Maps a raw value into the fitted [0, 1] range; a degenerate range
    /// (all training values equal) maps everything to zero
    pub fn transform(&self, value: f64) -> f64 {
        let span = self.data_max - self.data_min;
        if span > 0.0 {
            (value - self.data_min) / span
        } else {
            0.0
        }
    }

    /// Maps a scaled value back into the original range
    pub fn inverse_transform(&self, value: f64) -> f64 {
        value * (self.data_max - self.data_min) + self.data_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standardizer_centers_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.means, vec![3.0, 10.0]);

        let out = scaler.transform(&rows).unwrap();
        // first column has population std sqrt(8/3)
        let s = (8.0f64 / 3.0).sqrt();
        assert!((out[0][0] - (-2.0 / s)).abs() < 1e-12);
        assert!((out[2][0] - (2.0 / s)).abs() < 1e-12);
        // constant column only shifts
        assert_eq!(out[0][1], 0.0);
        assert_eq!(out[2][1], 0.0);
    }

    #[test]
    fn standardizer_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            StandardScaler::fit(&rows),
            Err(PipelineError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn min_max_round_trips() {
        let scaler = MinMaxScaler::fit(&[480.0, 820.0, 640.0]).unwrap();
        assert_eq!(scaler.data_min, 480.0);
        assert_eq!(scaler.data_max, 820.0);

        assert_eq!(scaler.transform(480.0), 0.0);
        assert_eq!(scaler.transform(820.0), 1.0);

        let v = 712.5;
        let back = scaler.inverse_transform(scaler.transform(v));
        assert!((back - v).abs() < 1e-12);
    }

    #[test]
    fn degenerate_target_range_maps_to_zero() {
        let scaler = MinMaxScaler::fit(&[5.0, 5.0]).unwrap();
        assert_eq!(scaler.transform(5.0), 0.0);
        assert_eq!(scaler.transform(9.0), 0.0);
    }
}
