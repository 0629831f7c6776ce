//! Pipeline configuration, loaded from TOML with CLI overrides on top.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CandidateOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("test_split_ratio {0} must be inside (0, 1)")]
    InvalidSplitRatio(f32),
    #[error("quality_threshold {0} must be a finite number no greater than 1")]
    InvalidQualityThreshold(f64),
    #[error("invalid candidate options: {0}")]
    InvalidCandidates(String),
}

/// All knobs for one training run. Passed explicitly; nothing reads
/// ambient globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with the labeled training data.
    pub train_path: PathBuf,
    /// Directory receiving `transformer.json`, `model.json`, `report.json`.
    pub artifact_dir: PathBuf,
    /// Held-out fraction for evaluation.
    pub test_split_ratio: f32,
    /// Seed for the split and every seeded candidate.
    pub seed: u64,
    /// Minimum acceptable held-out R2 for the selected model.
    pub quality_threshold: f64,
    /// Hyperparameters for the candidate registry, `[candidates]` in TOML.
    pub candidates: CandidateOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("data/students.csv"),
            artifact_dir: PathBuf::from("artifacts"),
            test_split_ratio: 0.2,
            seed: 42,
            quality_threshold: 0.6,
            candidates: CandidateOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Write the config as TOML, atomically: the file is staged next to the
    /// destination and renamed into place so a crash never leaves a partial
    /// config behind.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let tmp_path = path.with_extension("toml.tmp");
        let write = |tmp: &Path| -> Result<(), std::io::Error> {
            let mut file = std::fs::File::create(tmp)?;
            file.write_all(data.as_bytes())?;
            file.sync_all()
        };
        write(&tmp_path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp_path);
            ConfigError::Write {
                path: tmp_path.clone(),
                source,
            }
        })?;
        std::fs::rename(&tmp_path, path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp_path);
            ConfigError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_split_ratio > 0.0 && self.test_split_ratio < 1.0) {
            return Err(ConfigError::InvalidSplitRatio(self.test_split_ratio));
        }
        if !self.quality_threshold.is_finite() || self.quality_threshold > 1.0 {
            return Err(ConfigError::InvalidQualityThreshold(self.quality_threshold));
        }
        let c = &self.candidates;
        if c.knn_k == 0
            || c.tree_max_depth == 0
            || c.tree_min_leaf == 0
            || c.forest_trees == 0
            || c.gbdt_rounds == 0
        {
            return Err(ConfigError::InvalidCandidates(
                "counts and depths must be at least 1".to_string(),
            ));
        }
        if !c.gbdt_learning_rate.is_finite() || c.gbdt_learning_rate <= 0.0 {
            return Err(ConfigError::InvalidCandidates(format!(
                "gbdt_learning_rate {} must be a positive finite number",
                c.gbdt_learning_rate
            )));
        }
        Ok(())
    }
}
