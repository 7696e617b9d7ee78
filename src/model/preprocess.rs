//! Column-wise preprocessing
//!
//! Numeric columns are standardized, categorical columns one-hot encoded
//! over the categories seen at fit time. A category never seen during
//! training encodes as all zeros in its block rather than failing; serving
//! must tolerate requests the survey never contained.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

use super::scaler::StandardScaler;

/// One-hot encoder over per-column category vocabularies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Categories per column, in first-seen order
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Collects each column's vocabulary from the training rows
    pub fn fit(rows: &[Vec<String>], columns: usize) -> Result<Self, PipelineError> {
        let mut categories: Vec<Vec<String>> = vec![Vec::new(); columns];
        for row in rows {
            if row.len() != columns {
                return Err(PipelineError::DimensionMismatch(format!(
                    "expected {} categorical columns, found {}",
                    columns,
                    row.len()
                )));
            }
            for (vocab, value) in categories.iter_mut().zip(row) {
                if !vocab.iter().any(|v| v == value) {
                    vocab.push(value.clone());
                }
            }
        }
        Ok(Self { categories })
    }

    /// Encoded width across all columns
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Encodes one row; unknown categories contribute an all-zero block
    pub fn transform_row(&self, row: &[String]) -> Result<Vec<f64>, PipelineError> {
        if row.len() != self.categories.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "expected {} categorical columns, found {}",
                self.categories.len(),
                row.len()
            )));
        }
        let mut encoded = Vec::with_capacity(self.width());
        for (vocab, value) in self.categories.iter().zip(row) {
            let hit = vocab.iter().position(|v| v == value);
            for i in 0..vocab.len() {
                encoded.push(if hit == Some(i) { 1.0 } else { 0.0 });
            }
        }
        Ok(encoded)
    }
}

/// Fitted column transform: standardized numerics then one-hot categoricals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub numeric: StandardScaler,
    pub categorical: OneHotEncoder,
}

impl ColumnTransform {
    /// Fits both blocks; categorical columns may be zero-width
    pub fn fit(
        numeric_rows: &[Vec<f64>],
        categorical_rows: &[Vec<String>],
        categorical_columns: usize,
    ) -> Result<Self, PipelineError> {
        if categorical_columns > 0 && numeric_rows.len() != categorical_rows.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "{} numeric rows but {} categorical rows",
                numeric_rows.len(),
                categorical_rows.len()
            )));
        }
        Ok(Self {
            numeric: StandardScaler::fit(numeric_rows)?,
            categorical: OneHotEncoder::fit(categorical_rows, categorical_columns)?,
        })
    }

    /// Transformed width: numeric columns plus the encoded block
    pub fn width(&self) -> usize {
        self.numeric.means.len() + self.categorical.width()
    }

    pub fn transform_row(
        &self,
        numeric: &[f64],
        categorical: &[String],
    ) -> Result<Vec<f64>, PipelineError> {
        let mut out = self.numeric.transform_row(numeric)?;
        out.extend(self.categorical.transform_row(categorical)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn vocabulary_is_first_seen_order() {
        let rows = rows(&[&["Male", "21 to 35"], &["Female", "21 to 35"]]);
        let encoder = OneHotEncoder::fit(&rows, 2).unwrap();
        assert_eq!(encoder.categories[0], vec!["Male", "Female"]);
        assert_eq!(encoder.categories[1], vec!["21 to 35"]);
        assert_eq!(encoder.width(), 3);
    }

    #[test]
    fn known_category_sets_exactly_one_bit_per_column() {
        let train = rows(&[&["Male", "21 to 35"], &["Female", "36 to 50"]]);
        let encoder = OneHotEncoder::fit(&train, 2).unwrap();

        let encoded = encoder
            .transform_row(&["Female".to_string(), "21 to 35".to_string()])
            .unwrap();
        assert_eq!(encoded, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn unknown_category_encodes_as_zeros() {
        let train = rows(&[&["Male"], &["Female"]]);
        let encoder = OneHotEncoder::fit(&train, 1).unwrap();

        let encoded = encoder.transform_row(&["Nonbinary".to_string()]).unwrap();
        assert_eq!(encoded, vec![0.0, 0.0]);
    }

    #[test]
    fn transform_concatenates_numeric_then_encoded() {
        let numeric = vec![vec![1.0], vec![3.0]];
        let categorical = rows(&[&["a"], &["b"]]);
        let transform = ColumnTransform::fit(&numeric, &categorical, 1).unwrap();
        assert_eq!(transform.width(), 3);

        let out = transform
            .transform_row(&[3.0], &["a".to_string()])
            .unwrap();
        assert_eq!(out.len(), 3);
        // mean 2, std 1 -> z-score 1
        assert_eq!(out[0], 1.0);
        assert_eq!(&out[1..], &[1.0, 0.0]);
    }

    #[test]
    fn zero_width_categorical_block_is_allowed() {
        let numeric = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let transform = ColumnTransform::fit(&numeric, &[], 0).unwrap();
        assert_eq!(transform.width(), 2);
        let out = transform.transform_row(&[1.0, 2.0], &[]).unwrap();
        assert_eq!(out.len(), 2);
    }
}
