//! Persistence of the fitted artifact pair.
//!
//! The serving layer reads `transformer.json` and `model.json` from the
//! artifact directory; `report.json` is a diagnostic supplement. All files
//! are staged next to their final names and renamed only after every
//! serialization and write succeeded, so a failed run never clobbers the
//! previous pair.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureTransformer;
use crate::models::Regressor;
use crate::trial::{TrialFailure, TrialScore};

pub const TRANSFORMER_FILE: &str = "transformer.json";
pub const MODEL_FILE: &str = "model.json";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to create artifact directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {name}: {source}")]
    Encode {
        name: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact {path} is not usable: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Selected model artifact: the fitted parameters plus selection metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub artifact_version: i64,
    pub name: String,
    pub train_r2: f64,
    pub test_r2: f64,
    pub model: Regressor,
}

/// Diagnostic record of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub selected: String,
    pub quality_threshold: f64,
    pub seed: u64,
    pub test_split_ratio: f32,
    pub scores: Vec<TrialScore>,
    pub failures: Vec<TrialFailure>,
}

/// Write the artifact pair and report, replacing any previous run's output.
pub fn save_artifacts(
    dir: &Path,
    transformer: &FeatureTransformer,
    model: &SavedModel,
    report: &TrainingReport,
) -> Result<(), ArtifactError> {
    fs::create_dir_all(dir).map_err(|source| ArtifactError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    // Serialize everything up front so an encode failure writes nothing.
    let files = [
        (TRANSFORMER_FILE, encode("transformer", transformer)?),
        (MODEL_FILE, encode("model", model)?),
        (REPORT_FILE, encode("report", report)?),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (name, data) in &files {
        let final_path = dir.join(name);
        let tmp_path = dir.join(format!("{name}.tmp"));
        if let Err(source) = fs::write(&tmp_path, data) {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            let _ = fs::remove_file(&tmp_path);
            return Err(ArtifactError::Write {
                path: tmp_path,
                source,
            });
        }
        staged.push((tmp_path, final_path));
    }

    // Every write succeeded; renames within one directory should not fail
    // under normal conditions, and prior artifacts stay intact until here.
    for (tmp, final_path) in &staged {
        if let Err(source) = fs::rename(tmp, final_path) {
            for (remaining, _) in &staged {
                let _ = fs::remove_file(remaining);
            }
            return Err(ArtifactError::Write {
                path: final_path.clone(),
                source,
            });
        }
    }
    Ok(())
}

/// Load the artifact pair for prediction.
///
/// Both files are structurally checked right after decoding; a corrupt
/// artifact is reported as an error instead of panicking mid-prediction.
pub fn load_artifacts(dir: &Path) -> Result<(FeatureTransformer, SavedModel), ArtifactError> {
    let transformer_path = dir.join(TRANSFORMER_FILE);
    let transformer: FeatureTransformer = read_json(&transformer_path)?;
    transformer
        .validate()
        .map_err(|err| ArtifactError::Invalid {
            path: transformer_path,
            reason: err.to_string(),
        })?;

    let model_path = dir.join(MODEL_FILE);
    let model: SavedModel = read_json(&model_path)?;
    model.model.validate().map_err(|reason| ArtifactError::Invalid {
        path: model_path,
        reason,
    })?;
    Ok((transformer, model))
}

fn encode<T: Serialize>(name: &'static str, value: &T) -> Result<Vec<u8>, ArtifactError> {
    let mut data = serde_json::to_vec_pretty(value)
        .map_err(|source| ArtifactError::Encode { name, source })?;
    data.push(b'\n');
    Ok(data)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
