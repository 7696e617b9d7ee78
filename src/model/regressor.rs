//! Least-squares regressor
//!
//! Ordinary least squares fitted by normal equations, exposing the
//! intercept and per-column coefficients. A small ridge damping keeps the
//! normal matrix invertible: full one-hot blocks are collinear with the
//! intercept, so the undamped system is singular by construction.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Diagonal damping applied before solving
const RIDGE_DAMPING: f64 = 1e-8;

/// Pivot magnitude below which the system counts as singular
const PIVOT_EPSILON: f64 = 1e-12;

/// Fitted linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    /// Fits the model on transformed rows
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, PipelineError> {
        let first = x
            .first()
            .ok_or_else(|| PipelineError::DegenerateFit("no rows to fit".to_string()))?;
        if x.len() != y.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }

        let p = first.len();
        let dim = p + 1;
        let mut normal = vec![vec![0.0; dim]; dim];
        let mut moment = vec![0.0; dim];

        for (row, &target) in x.iter().zip(y) {
            if row.len() != p {
                return Err(PipelineError::DimensionMismatch(format!(
                    "expected {} features, found {}",
                    p,
                    row.len()
                )));
            }
            for i in 0..dim {
                let xi = if i == 0 { 1.0 } else { row[i - 1] };
                moment[i] += xi * target;
                for j in i..dim {
                    let xj = if j == 0 { 1.0 } else { row[j - 1] };
                    normal[i][j] += xi * xj;
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                normal[i][j] = normal[j][i];
            }
            normal[i][i] += RIDGE_DAMPING;
        }

        let weights = solve(normal, moment)?;
        Ok(Self {
            intercept: weights[0],
            coefficients: weights[1..].to_vec(),
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, PipelineError> {
        if row.len() != self.coefficients.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "expected {} features, found {}",
                self.coefficients.len(),
                row.len()
            )));
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(row)
            .map(|(c, v)| c * v)
            .sum();
        Ok(self.intercept + dot)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, PipelineError> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, PipelineError> {
    let n = b.len();

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(PipelineError::DegenerateFit(
                "singular normal matrix".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor != 0.0 {
                for (av, pv) in a[row][col..].iter_mut().zip(&pivot_row[col..]) {
                    *av -= factor * pv;
                }
                b[row] -= factor * b[col];
            }
        }
    }

    let mut weights = vec![0.0; n];
    for i in (0..n).rev() {
        let mut acc = b[i];
        for j in i + 1..n {
            acc -= a[i][j] * weights[j];
        }
        weights[i] = acc / a[i][i];
    }
    Ok(weights)
}
