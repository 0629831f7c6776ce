//! Candidate regression models behind one fit-and-predict interface.
//!
//! The registry is a closed, ordered set: selection ties break toward the
//! earlier entry, so the order below is part of the pipeline contract.

use serde::{Deserialize, Serialize};

mod binning;
mod forest;
mod gbdt;
mod knn;
mod linear;
pub mod metrics;
mod tree;

pub use forest::{ForestModel, ForestTrainer};
pub use gbdt::{GbdtModel, GbdtTrainer, Stump};
pub use knn::{KnnModel, KnnTrainer};
pub use linear::{LinearModel, LinearTrainer};
pub use tree::{TreeModel, TreeNode, TreeOptions, TreeTrainer};

/// A fitted regression model, serializable as one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearModel),
    Knn(KnnModel),
    Tree(TreeModel),
    Forest(ForestModel),
    Gbdt(GbdtModel),
}

impl Regressor {
    /// Predict one transformed feature row.
    pub fn predict(&self, row: &[f32]) -> f32 {
        match self {
            Regressor::Linear(m) => m.predict(row),
            Regressor::Knn(m) => m.predict(row),
            Regressor::Tree(m) => m.predict(row),
            Regressor::Forest(m) => m.predict(row),
            Regressor::Gbdt(m) => m.predict(row),
        }
    }

    /// Predict a whole matrix, row by row.
    pub fn predict_all(&self, x: &[Vec<f32>]) -> Vec<f32> {
        x.iter().map(|row| self.predict(row)).collect()
    }

    /// Structural sanity check for deserialized models.
    ///
    /// Loaders call this before predicting so a corrupt artifact turns into
    /// an error instead of a panic mid-prediction.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Regressor::Linear(m) => {
                if m.weights.is_empty() {
                    return Err("linear model has no weights".to_string());
                }
                if !m.intercept.is_finite() || m.weights.iter().any(|w| !w.is_finite()) {
                    return Err("linear model has non-finite parameters".to_string());
                }
                Ok(())
            }
            Regressor::Knn(m) => {
                if m.k == 0 {
                    return Err("knn model has k = 0".to_string());
                }
                if m.points.is_empty() || m.points.len() != m.labels.len() {
                    return Err("knn model has mismatched points/labels".to_string());
                }
                Ok(())
            }
            Regressor::Tree(m) => m.validate(),
            Regressor::Forest(m) => {
                if m.trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                for tree in &m.trees {
                    tree.validate()?;
                }
                Ok(())
            }
            Regressor::Gbdt(m) => {
                if !m.init.is_finite() || !m.learning_rate.is_finite() {
                    return Err("gbdt model has non-finite parameters".to_string());
                }
                Ok(())
            }
        }
    }
}

/// One candidate algorithm: a name and a fallible fit.
///
/// Implementations must be deterministic for fixed inputs and options; any
/// randomness is driven by a seed carried in the trainer itself.
pub trait Trainer {
    fn name(&self) -> &'static str;
    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String>;
}

/// Tunable knobs for the candidate registry.
///
/// The config layer deserializes these from the `[candidates]` table;
/// defaults match the values the pipeline ships with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateOptions {
    pub knn_k: usize,
    pub tree_max_depth: usize,
    pub tree_min_leaf: usize,
    pub forest_trees: usize,
    pub gbdt_rounds: usize,
    pub gbdt_learning_rate: f32,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            knn_k: 5,
            tree_max_depth: 8,
            tree_min_leaf: 4,
            forest_trees: 50,
            gbdt_rounds: 200,
            gbdt_learning_rate: 0.1,
        }
    }
}

impl CandidateOptions {
    fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            max_depth: self.tree_max_depth,
            min_leaf: self.tree_min_leaf,
            ..TreeOptions::default()
        }
    }
}

/// The fixed candidate registry, in tie-break order.
pub fn registry(seed: u64, options: &CandidateOptions) -> Vec<Box<dyn Trainer>> {
    vec![
        Box::new(LinearTrainer::least_squares()),
        Box::new(LinearTrainer::ridge()),
        Box::new(KnnTrainer { k: options.knn_k }),
        Box::new(TreeTrainer {
            options: options.tree_options(),
        }),
        Box::new(ForestTrainer {
            n_trees: options.forest_trees,
            seed,
            options: options.tree_options(),
        }),
        Box::new(GbdtTrainer {
            rounds: options.gbdt_rounds,
            learning_rate: options.gbdt_learning_rate,
            ..GbdtTrainer::default()
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_is_stable() {
        let names: Vec<&str> = registry(0, &CandidateOptions::default())
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "linear",
                "ridge",
                "knn",
                "decision_tree",
                "random_forest",
                "gbdt"
            ]
        );
    }

    #[test]
    fn fitted_models_round_trip_through_json() {
        let x: Vec<Vec<f32>> = (0..30).map(|i| vec![i as f32, (i % 3) as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| 2.0 * r[0] + r[1]).collect();
        for trainer in registry(7, &CandidateOptions::default()) {
            let model = trainer.fit(&x, &y).unwrap();
            let json = serde_json::to_string(&model).unwrap();
            let back: Regressor = serde_json::from_str(&json).unwrap();
            assert_eq!(model, back, "candidate {}", trainer.name());
            let sample = vec![11.0f32, 2.0];
            assert_eq!(model.predict(&sample), back.predict(&sample));
        }
    }

    #[test]
    fn every_candidate_is_deterministic() {
        let x: Vec<Vec<f32>> = (0..40).map(|i| vec![i as f32, (i % 5) as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| r[0] - 0.5 * r[1]).collect();
        for trainer in registry(11, &CandidateOptions::default()) {
            let a = trainer.fit(&x, &y).unwrap();
            let b = trainer.fit(&x, &y).unwrap();
            assert_eq!(
                a.predict_all(&x),
                b.predict_all(&x),
                "candidate {}",
                trainer.name()
            );
        }
    }

    #[test]
    fn registry_threads_candidate_options() {
        let options = CandidateOptions {
            knn_k: 2,
            tree_max_depth: 2,
            tree_min_leaf: 1,
            forest_trees: 3,
            gbdt_rounds: 5,
            gbdt_learning_rate: 0.2,
        };
        let x: Vec<Vec<f32>> = (0..30).map(|i| vec![i as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| 3.0 * r[0] + 1.0).collect();
        for trainer in registry(3, &options) {
            match trainer.fit(&x, &y).unwrap() {
                Regressor::Knn(m) => assert_eq!(m.k, 2),
                Regressor::Forest(m) => assert_eq!(m.trees.len(), 3),
                Regressor::Gbdt(m) => {
                    assert_eq!(m.learning_rate, 0.2);
                    assert!(m.stumps.len() <= 5);
                }
                Regressor::Tree(_) | Regressor::Linear(_) => {}
            }
        }
    }

    #[test]
    fn fitted_models_pass_validation() {
        let x: Vec<Vec<f32>> = (0..30).map(|i| vec![i as f32, (i % 4) as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| r[0] + r[1]).collect();
        for trainer in registry(5, &CandidateOptions::default()) {
            let model = trainer.fit(&x, &y).unwrap();
            assert!(model.validate().is_ok(), "candidate {}", trainer.name());
        }
    }

    #[test]
    fn corrupt_artifacts_fail_validation() {
        let tree: Regressor = serde_json::from_str(r#"{"kind":"tree","nodes":[]}"#).unwrap();
        assert!(tree.validate().is_err());

        let forest: Regressor = serde_json::from_str(r#"{"kind":"forest","trees":[]}"#).unwrap();
        assert!(forest.validate().is_err());

        let knn = Regressor::Knn(KnnModel {
            k: 3,
            points: vec![vec![1.0]],
            labels: Vec::new(),
        });
        assert!(knn.validate().is_err());
    }
}
