//! Random forest regressor: seeded bootstrap bagging of regression trees.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{self, TreeModel, TreeOptions};
use super::{Regressor, Trainer, binning};

/// Fitted forest; prediction averages the member trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<TreeModel>,
}

impl ForestModel {
    pub fn predict(&self, row: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|t| f64::from(t.predict(row)))
            .sum();
        (sum / self.trees.len() as f64) as f32
    }
}

#[derive(Debug, Clone)]
pub struct ForestTrainer {
    pub n_trees: usize,
    pub seed: u64,
    pub options: TreeOptions,
}

impl ForestTrainer {
    pub fn new(seed: u64) -> Self {
        Self {
            n_trees: 50,
            seed,
            options: TreeOptions::default(),
        }
    }
}

impl Trainer for ForestTrainer {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String> {
        if x.is_empty() || y.is_empty() {
            return Err("empty training set".to_string());
        }
        if x.len() != y.len() {
            return Err("mismatched feature/label lengths".to_string());
        }
        if self.n_trees == 0 {
            return Err("forest needs at least one tree".to_string());
        }
        let n = x.len();
        let width = x[0].len();
        // ceil(sqrt(d)) features per tree, the usual regression bagging pick.
        let features_per_tree = ((width as f64).sqrt().ceil() as usize).clamp(1, width);

        let binned = binning::bin_matrix(x, self.options.bins);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let all_features: Vec<usize> = (0..width).collect();

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let mut features = all_features.clone();
            features.shuffle(&mut rng);
            features.truncate(features_per_tree);
            features.sort_unstable();
            trees.push(tree::grow_tree(
                &binned,
                x,
                y,
                rows,
                &features,
                &self.options,
            ));
        }
        Ok(Regressor::Forest(ForestModel { trees }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_step() -> (Vec<Vec<f32>>, Vec<f32>) {
        let x: Vec<Vec<f32>> = (0..60)
            .map(|i| vec![i as f32, (i % 3) as f32, (i % 5) as f32])
            .collect();
        let y: Vec<f32> = (0..60)
            .map(|i| if i < 30 { 10.0 } else { 40.0 })
            .collect();
        (x, y)
    }

    #[test]
    fn fits_step_function_roughly() {
        let (x, y) = noisy_step();
        let model = ForestTrainer::new(9).fit(&x, &y).unwrap();
        assert!(model.predict(&[5.0, 2.0, 0.0]) < 25.0);
        assert!(model.predict(&[55.0, 1.0, 0.0]) > 25.0);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let (x, y) = noisy_step();
        let a = ForestTrainer::new(3).fit(&x, &y).unwrap();
        let b = ForestTrainer::new(3).fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let (x, y) = noisy_step();
        let a = ForestTrainer::new(1).fit(&x, &y).unwrap();
        let b = ForestTrainer::new(2).fit(&x, &y).unwrap();
        assert_ne!(a, b);
    }
}
