//! Preprocessing and regression glued into one fit/predict surface
//!
//! The pipeline owns the fitted column transform and the regressor so a
//! single artifact restores everything inference needs. Splitting and the
//! evaluation helpers live here too since training is their only caller.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::model::preprocess::ColumnTransform;
use crate::model::regressor::LinearRegressor;

/// Fitted preprocessing plus regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPipeline {
    pub preprocess: ColumnTransform,
    pub regressor: LinearRegressor,
}

impl ModelPipeline {
    /// Fits the transform on the raw columns, then the regressor on the
    /// transformed rows
    pub fn fit(
        numeric_rows: &[Vec<f64>],
        categorical_rows: &[Vec<String>],
        categorical_columns: usize,
        y: &[f64],
    ) -> Result<Self, PipelineError> {
        let preprocess = ColumnTransform::fit(numeric_rows, categorical_rows, categorical_columns)?;

        let mut transformed = Vec::with_capacity(numeric_rows.len());
        let empty: Vec<String> = Vec::new();
        for (i, numeric) in numeric_rows.iter().enumerate() {
            let categorical = categorical_rows.get(i).unwrap_or(&empty);
            transformed.push(preprocess.transform_row(numeric, categorical)?);
        }

        let regressor = LinearRegressor::fit(&transformed, y)?;
        Ok(Self {
            preprocess,
            regressor,
        })
    }

    pub fn predict_row(
        &self,
        numeric: &[f64],
        categorical: &[String],
    ) -> Result<f64, PipelineError> {
        let transformed = self.preprocess.transform_row(numeric, categorical)?;
        self.regressor.predict_row(&transformed)
    }

    pub fn predict(
        &self,
        numeric_rows: &[Vec<f64>],
        categorical_rows: &[Vec<String>],
    ) -> Result<Vec<f64>, PipelineError> {
        let empty: Vec<String> = Vec::new();
        numeric_rows
            .iter()
            .enumerate()
            .map(|(i, numeric)| {
                let categorical = categorical_rows.get(i).unwrap_or(&empty);
                self.predict_row(numeric, categorical)
            })
            .collect()
    }
}

/// Train and test metrics for one fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub r2: f64,
    pub rmse: f64,
}

/// Shuffles `0..n` with a seeded generator and splits off the holdout tail.
///
/// Returns `(train, test)` index sets. The test share is rounded up, but a
/// single training row is always kept when `n > 0`.
pub fn train_test_split(n: usize, holdout: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test_len = (n as f64 * holdout).ceil() as usize;
    test_len = test_len.min(n.saturating_sub(1));

    let train = indices[test_len..].to_vec();
    let test = indices[..test_len].to_vec();
    (train, test)
}

/// Coefficient of determination against the mean predictor
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Root mean squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return 0.0;
    }
    let mse: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}
