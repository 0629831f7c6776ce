//! Gradient-boosted regression stumps with binned split search.

use serde::{Deserialize, Serialize};

use super::binning::{self, BinnedMatrix};
use super::{Regressor, Trainer};

/// Single depth-one split contributing to the boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    pub feature_index: u16,
    pub threshold: f32,
    pub left_value: f32,
    pub right_value: f32,
}

impl Stump {
    pub fn predict(&self, row: &[f32]) -> f32 {
        let v = row.get(self.feature_index as usize).copied().unwrap_or(0.0);
        if v <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Fitted boosted-stump model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Base prediction, the training-label mean.
    pub init: f32,
    pub learning_rate: f32,
    pub stumps: Vec<Stump>,
}

impl GbdtModel {
    pub fn predict(&self, row: &[f32]) -> f32 {
        let mut sum = f64::from(self.init);
        for stump in &self.stumps {
            sum += f64::from(self.learning_rate) * f64::from(stump.predict(row));
        }
        sum as f32
    }
}

#[derive(Debug, Clone)]
pub struct GbdtTrainer {
    pub rounds: usize,
    pub learning_rate: f32,
    pub bins: usize,
}

impl Default for GbdtTrainer {
    fn default() -> Self {
        Self {
            rounds: 200,
            learning_rate: 0.1,
            bins: 32,
        }
    }
}

impl Trainer for GbdtTrainer {
    fn name(&self) -> &'static str {
        "gbdt"
    }

    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String> {
        if x.is_empty() || y.is_empty() {
            return Err("empty training set".to_string());
        }
        if x.len() != y.len() {
            return Err("mismatched feature/label lengths".to_string());
        }
        let n = x.len();
        let width = x[0].len();
        let binned = binning::bin_matrix(x, self.bins);
        let rows: Vec<usize> = (0..n).collect();

        let init = (y.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64) as f32;
        let mut residuals: Vec<f32> = y.iter().map(|&v| v - init).collect();

        let mut stumps = Vec::with_capacity(self.rounds);
        for _ in 0..self.rounds {
            let Some(stump) = fit_stump(&binned, x, &residuals, &rows, width) else {
                break;
            };
            for (i, row) in x.iter().enumerate() {
                residuals[i] -= self.learning_rate * stump.predict(row);
            }
            stumps.push(stump);
        }

        Ok(Regressor::Gbdt(GbdtModel {
            init,
            learning_rate: self.learning_rate,
            stumps,
        }))
    }
}

/// Fit the single best SSE-reducing stump to the residuals.
fn fit_stump(
    binned: &BinnedMatrix,
    x: &[Vec<f32>],
    residuals: &[f32],
    rows: &[usize],
    width: usize,
) -> Option<Stump> {
    let mut best: Option<(usize, usize, f64)> = None;
    for feature_idx in 0..width {
        if let Some(split) = binning::best_split_for_feature(binned, residuals, rows, feature_idx) {
            if best.map(|(_, _, score)| split.score < score).unwrap_or(true) {
                best = Some((feature_idx, split.split_bin, split.score));
            }
        }
    }
    let (feature_idx, split_bin, _) = best?;
    let threshold = binned.threshold(feature_idx, split_bin);

    let mut left_sum = 0.0f64;
    let mut left_count = 0u32;
    let mut right_sum = 0.0f64;
    let mut right_count = 0u32;
    for &row in rows {
        let r = f64::from(residuals[row]);
        if x[row][feature_idx] <= threshold {
            left_sum += r;
            left_count += 1;
        } else {
            right_sum += r;
            right_count += 1;
        }
    }
    let left_value = if left_count == 0 {
        0.0
    } else {
        (left_sum / f64::from(left_count)) as f32
    };
    let right_value = if right_count == 0 {
        0.0
    } else {
        (right_sum / f64::from(right_count)) as f32
    };
    Some(Stump {
        feature_index: feature_idx as u16,
        threshold,
        left_value,
        right_value,
    })
}
