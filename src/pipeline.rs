//! End-to-end training pipeline: load, split, transform, trial, select,
//! persist.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::artifacts::{self, ArtifactError, SavedModel, TrainingReport};
use crate::config::{ConfigError, PipelineConfig};
use crate::dataset::{self, DatasetError, LabeledRecord, StudentRecord};
use crate::features::{FeatureError, FeatureTransformer};
use crate::models::{self, Regressor};
use crate::split;
use crate::trial::{self, SelectError, TrialFailure};

/// Artifact schema version written into `model.json`.
pub const ARTIFACT_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("feature transform failed: {0}")]
    Features(#[from] FeatureError),
    #[error("split failed: {0}")]
    Split(String),
    #[error(transparent)]
    Selection(#[from] SelectError),
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
}

/// What a finished run produced, for callers and CLI reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub selected: String,
    pub train_r2: f64,
    pub test_r2: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_width: usize,
    pub artifact_dir: PathBuf,
    pub failures: Vec<TrialFailure>,
}

/// Run the full training pipeline and persist the artifact pair.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    config.validate()?;

    let records = dataset::load_records(&config.train_path)?;
    info!(rows = records.len(), path = %config.train_path.display(), "dataset loaded");

    let split = split::train_test_split(records.len(), config.test_split_ratio, config.seed)
        .map_err(PipelineError::Split)?;
    let train_records = select_rows(&records, &split.train);
    let test_records = select_rows(&records, &split.test);

    // The transformer only ever sees training rows; held-out rows flow
    // through the already-fitted mapping, same as inference traffic.
    let train_features: Vec<StudentRecord> =
        train_records.iter().map(|r| r.features.clone()).collect();
    let transformer = FeatureTransformer::fit(&train_features)?;
    info!(width = transformer.width(), "feature transformer fitted");

    let x_train = transformer.transform_all(&train_features)?;
    let y_train = dataset::labels(&train_records);
    let test_features: Vec<StudentRecord> =
        test_records.iter().map(|r| r.features.clone()).collect();
    let x_test = transformer.transform_all(&test_features)?;
    let y_test = dataset::labels(&test_records);

    let trainers = models::registry(config.seed, &config.candidates);
    let batch = trial::run_trials(&trainers, &x_train, &y_train, &x_test, &y_test);
    let scores = batch.scores();
    let failures = batch.failures.clone();
    let best = trial::select_best(batch.outcomes, config.quality_threshold)?;
    info!(
        selected = best.name,
        test_r2 = best.test_r2,
        "model selected"
    );

    let saved = SavedModel {
        artifact_version: ARTIFACT_VERSION,
        name: best.name.to_string(),
        train_r2: best.train_r2,
        test_r2: best.test_r2,
        model: best.model,
    };
    let report = TrainingReport {
        selected: saved.name.clone(),
        quality_threshold: config.quality_threshold,
        seed: config.seed,
        test_split_ratio: config.test_split_ratio,
        scores,
        failures: failures.clone(),
    };
    artifacts::save_artifacts(&config.artifact_dir, &transformer, &saved, &report)?;
    info!(dir = %config.artifact_dir.display(), "artifacts written");

    Ok(RunSummary {
        selected: saved.name,
        train_r2: saved.train_r2,
        test_r2: saved.test_r2,
        n_train: train_records.len(),
        n_test: test_records.len(),
        feature_width: transformer.width(),
        artifact_dir: config.artifact_dir.clone(),
        failures,
    })
}

/// Apply the persisted pair to one incoming record.
pub fn predict_one(
    transformer: &FeatureTransformer,
    model: &Regressor,
    record: &StudentRecord,
) -> Result<f32, FeatureError> {
    let row = transformer.transform(record)?;
    Ok(model.predict(&row))
}

fn select_rows(records: &[LabeledRecord], indices: &[usize]) -> Vec<LabeledRecord> {
    indices.iter().map(|&idx| records[idx].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_rows_preserves_order() {
        let records: Vec<LabeledRecord> = (0..4)
            .map(|i| LabeledRecord {
                features: StudentRecord {
                    gender: "female".to_string(),
                    ethnicity: "group A".to_string(),
                    parental_education: "some college".to_string(),
                    lunch: "standard".to_string(),
                    test_prep: "none".to_string(),
                    reading_score: i as f32,
                    writing_score: i as f32,
                },
                math_score: i as f32,
            })
            .collect();
        let picked = select_rows(&records, &[2, 0]);
        assert_eq!(picked[0].math_score, 2.0);
        assert_eq!(picked[1].math_score, 0.0);
    }
}
