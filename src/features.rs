//! Fitted feature transformer mapping raw records to numeric vectors.
//!
//! Numeric scores are standardized with the mean and spread learned from
//! training rows; categorical columns are one-hot encoded over the sorted
//! vocabulary observed at fit time. The fitted transformer is immutable and
//! applied identically to training rows and incoming prediction requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::StudentRecord;

/// Current transformer schema version, stored in the persisted artifact.
pub const TRANSFORMER_VERSION: i64 = 1;

/// Spread floor so a constant column cannot divide by zero.
const MIN_STD: f32 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("cannot fit transformer on an empty training set")]
    EmptyTrainingSet,
    /// Prediction-time value never seen while fitting. Rejected rather than
    /// zero-filled: a silently zeroed row is indistinguishable from a valid
    /// all-baseline row.
    #[error("unknown {column} value {value:?}")]
    UnknownCategory { column: String, value: String },
    #[error("transformer is invalid: {0}")]
    Invalid(String),
}

/// Standardization parameters for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f32,
    pub std: f32,
}

/// One-hot vocabulary for one categorical column, sorted for determinism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub vocabulary: Vec<String>,
}

/// Versioned, fitted transformer persisted as one half of the artifact pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTransformer {
    pub schema_version: i64,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl FeatureTransformer {
    /// Fit standardization and vocabularies on the training rows.
    pub fn fit(records: &[StudentRecord]) -> Result<Self, FeatureError> {
        if records.is_empty() {
            return Err(FeatureError::EmptyTrainingSet);
        }
        let n = records.len() as f64;

        let mut numeric = Vec::new();
        for slot in 0..records[0].numeric_fields().len() {
            let name = records[0].numeric_fields()[slot].0;
            let mut sum = 0.0f64;
            for record in records {
                sum += f64::from(record.numeric_fields()[slot].1);
            }
            let mean = sum / n;
            let mut ss = 0.0f64;
            for record in records {
                let d = f64::from(record.numeric_fields()[slot].1) - mean;
                ss += d * d;
            }
            let std = ((ss / n).sqrt() as f32).max(MIN_STD);
            numeric.push(NumericColumn {
                name: name.to_string(),
                mean: mean as f32,
                std,
            });
        }

        let mut categorical = Vec::new();
        for slot in 0..records[0].categorical_fields().len() {
            let name = records[0].categorical_fields()[slot].0;
            let mut values = std::collections::BTreeSet::new();
            for record in records {
                values.insert(record.categorical_fields()[slot].1.to_string());
            }
            categorical.push(CategoricalColumn {
                name: name.to_string(),
                vocabulary: values.into_iter().collect(),
            });
        }

        let transformer = Self {
            schema_version: TRANSFORMER_VERSION,
            numeric,
            categorical,
        };
        transformer.validate()?;
        Ok(transformer)
    }

    /// Validate internal consistency of a fitted or deserialized transformer.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.numeric.is_empty() {
            return Err(FeatureError::Invalid("no numeric columns".to_string()));
        }
        for column in &self.numeric {
            if !column.mean.is_finite() || !column.std.is_finite() || column.std <= 0.0 {
                return Err(FeatureError::Invalid(format!(
                    "bad scaling for {}",
                    column.name
                )));
            }
        }
        for column in &self.categorical {
            if column.vocabulary.is_empty() {
                return Err(FeatureError::Invalid(format!(
                    "empty vocabulary for {}",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Output vector width, constant across all rows.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.vocabulary.len())
                .sum::<usize>()
    }

    /// Map one record to a fixed-width feature vector.
    pub fn transform(&self, record: &StudentRecord) -> Result<Vec<f32>, FeatureError> {
        let mut out = Vec::with_capacity(self.width());
        for (column, (_, value)) in self.numeric.iter().zip(record.numeric_fields()) {
            out.push((value - column.mean) / column.std);
        }
        for (column, (_, value)) in self.categorical.iter().zip(record.categorical_fields()) {
            let hit = column
                .vocabulary
                .binary_search_by(|v| v.as_str().cmp(value))
                .map_err(|_| FeatureError::UnknownCategory {
                    column: column.name.clone(),
                    value: value.to_string(),
                })?;
            let start = out.len();
            out.resize(start + column.vocabulary.len(), 0.0);
            out[start + hit] = 1.0;
        }
        Ok(out)
    }

    /// Transform a batch of records into a row-major matrix.
    pub fn transform_all(&self, records: &[StudentRecord]) -> Result<Vec<Vec<f32>>, FeatureError> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(gender: &str, reading: f32, writing: f32) -> StudentRecord {
        StudentRecord {
            gender: gender.to_string(),
            ethnicity: "group A".to_string(),
            parental_education: "some college".to_string(),
            lunch: "standard".to_string(),
            test_prep: "none".to_string(),
            reading_score: reading,
            writing_score: writing,
        }
    }

    #[test]
    fn output_width_is_constant() {
        let rows = vec![
            record("female", 60.0, 70.0),
            record("male", 40.0, 50.0),
            record("female", 80.0, 90.0),
        ];
        let transformer = FeatureTransformer::fit(&rows).unwrap();
        // 2 numeric + gender(2) + 1 each for the constant categorical columns.
        assert_eq!(transformer.width(), 2 + 2 + 1 + 1 + 1 + 1);
        for row in &rows {
            assert_eq!(transformer.transform(row).unwrap().len(), transformer.width());
        }
    }

    #[test]
    fn standardizes_numeric_columns() {
        let rows = vec![record("female", 60.0, 70.0), record("male", 80.0, 90.0)];
        let transformer = FeatureTransformer::fit(&rows).unwrap();
        let out = transformer.transform(&rows[0]).unwrap();
        // mean 70, std 10 -> (60 - 70) / 10.
        assert!((out[0] + 1.0).abs() < 1e-5);
        assert!((out[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn one_hot_uses_sorted_vocabulary() {
        let rows = vec![record("male", 60.0, 70.0), record("female", 80.0, 90.0)];
        let transformer = FeatureTransformer::fit(&rows).unwrap();
        let female = transformer.transform(&rows[1]).unwrap();
        let male = transformer.transform(&rows[0]).unwrap();
        // "female" sorts before "male".
        assert_eq!(&female[2..4], &[1.0, 0.0]);
        assert_eq!(&male[2..4], &[0.0, 1.0]);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let rows = vec![record("female", 60.0, 70.0), record("male", 80.0, 90.0)];
        let transformer = FeatureTransformer::fit(&rows).unwrap();
        let mut record = rows[0].clone();
        record.lunch = "premium".to_string();
        let err = transformer.transform(&record).unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownCategory {
                column: "lunch".to_string(),
                value: "premium".to_string(),
            }
        );
    }

    #[test]
    fn empty_training_set_fails() {
        assert_eq!(
            FeatureTransformer::fit(&[]).unwrap_err(),
            FeatureError::EmptyTrainingSet
        );
    }

    #[test]
    fn constant_column_keeps_finite_output() {
        let rows = vec![record("female", 50.0, 50.0), record("male", 50.0, 50.0)];
        let transformer = FeatureTransformer::fit(&rows).unwrap();
        let out = transformer.transform(&rows[0]).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
