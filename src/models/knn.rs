//! Brute-force k-nearest-neighbors regressor.
//!
//! The training matrix is small enough that a linear scan per query beats
//! any index structure. Distance ties are broken by training-row index so
//! predictions are deterministic.

use serde::{Deserialize, Serialize};

use super::{Regressor, Trainer};

/// Fitted KNN model, carrying its training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnModel {
    pub k: usize,
    pub points: Vec<Vec<f32>>,
    pub labels: Vec<f32>,
}

impl KnnModel {
    /// Mean label of the `k` nearest training points.
    pub fn predict(&self, row: &[f32]) -> f32 {
        let mut distances: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (squared_distance(point, row), idx))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let k = self.k.min(distances.len()).max(1);
        let sum: f64 = distances[..k]
            .iter()
            .map(|&(_, idx)| f64::from(self.labels[idx]))
            .sum();
        (sum / k as f64) as f32
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct KnnTrainer {
    pub k: usize,
}

impl Default for KnnTrainer {
    fn default() -> Self {
        Self { k: 5 }
    }
}

impl Trainer for KnnTrainer {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String> {
        if x.is_empty() || y.is_empty() {
            return Err("empty training set".to_string());
        }
        if x.len() != y.len() {
            return Err("mismatched feature/label lengths".to_string());
        }
        if self.k == 0 {
            return Err("k must be at least 1".to_string());
        }
        Ok(Regressor::Knn(KnnModel {
            k: self.k.min(x.len()),
            points: x.to_vec(),
            labels: y.to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_mean_of_nearest_neighbors() {
        let x: Vec<Vec<f32>> = vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]];
        let y = vec![0.0f32, 1.0, 2.0, 100.0];
        let model = KnnTrainer { k: 3 }.fit(&x, &y).unwrap();
        // Nearest three to 1.0 are rows 0..2.
        assert!((model.predict(&[1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn k_is_clamped_to_training_size() {
        let x = vec![vec![0.0f32], vec![1.0]];
        let y = vec![2.0f32, 4.0];
        let model = KnnTrainer { k: 10 }.fit(&x, &y).unwrap();
        assert!((model.predict(&[0.5]) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn ties_break_by_row_index() {
        // Two equidistant neighbors with k = 1: the earlier row wins.
        let x = vec![vec![-1.0f32], vec![1.0]];
        let y = vec![10.0f32, 20.0];
        let model = KnnTrainer { k: 1 }.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&[0.0]), 10.0);
    }

    #[test]
    fn rejects_zero_k() {
        assert!(KnnTrainer { k: 0 }.fit(&[vec![0.0]], &[1.0]).is_err());
    }
}
