//! Variance-reduction regression tree over binned features.

use serde::{Deserialize, Serialize};

use super::binning::{self, BinnedMatrix};
use super::{Regressor, Trainer};

/// Split-search and stopping parameters shared with the forest candidate.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: usize,
    /// Minimum rows allowed in a leaf.
    pub min_leaf: usize,
    /// Number of bins used for split search.
    pub bins: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_leaf: 4,
            bins: 32,
        }
    }
}

/// One node of a flattened regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature_index: u16,
        threshold: f32,
        /// Index of the `<= threshold` child in the node arena.
        left: u32,
        right: u32,
    },
    Leaf {
        value: f32,
    },
}

/// Fitted regression tree, nodes stored in an arena with the root at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeModel {
    pub nodes: Vec<TreeNode>,
}

impl TreeModel {
    pub fn predict(&self, row: &[f32]) -> f32 {
        let mut node = 0usize;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature_index as usize).copied().unwrap_or(0.0);
                    node = if v <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    /// Check a deserialized arena before it is walked.
    ///
    /// Children are always appended after their parent, so child indices
    /// must be in range and strictly greater than the node's own index;
    /// anything else would panic or loop in [`TreeModel::predict`].
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len() as u32;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                let idx = idx as u32;
                if *left >= len || *right >= len || *left <= idx || *right <= idx {
                    return Err(format!("tree node {idx} has out-of-order children"));
                }
            }
        }
        Ok(())
    }
}

/// Grow a tree on a row subset, restricted to the given feature indices.
///
/// Shared by [`TreeTrainer`] (all rows, all features) and the forest
/// (bootstrap rows, random feature subset).
pub(crate) fn grow_tree(
    binned: &BinnedMatrix,
    x: &[Vec<f32>],
    y: &[f32],
    rows: Vec<usize>,
    features: &[usize],
    options: &TreeOptions,
) -> TreeModel {
    let mut nodes = Vec::new();
    grow_node(binned, x, y, rows, features, options, 0, &mut nodes);
    TreeModel { nodes }
}

#[allow(clippy::too_many_arguments)]
fn grow_node(
    binned: &BinnedMatrix,
    x: &[Vec<f32>],
    y: &[f32],
    rows: Vec<usize>,
    features: &[usize],
    options: &TreeOptions,
    depth: usize,
    nodes: &mut Vec<TreeNode>,
) -> u32 {
    let idx = nodes.len() as u32;
    let leaf_value = binning::subset_mean(y, &rows);

    if depth >= options.max_depth || rows.len() < 2 * options.min_leaf.max(1) {
        nodes.push(TreeNode::Leaf { value: leaf_value });
        return idx;
    }

    let parent_sse = binning::subset_sse(y, &rows);
    let mut best: Option<(usize, usize, f64)> = None;
    for &feature_idx in features {
        if let Some(split) = binning::best_split_for_feature(binned, y, &rows, feature_idx) {
            if best.map(|(_, _, score)| split.score < score).unwrap_or(true) {
                best = Some((feature_idx, split.split_bin, split.score));
            }
        }
    }
    let Some((feature_idx, split_bin, score)) = best else {
        nodes.push(TreeNode::Leaf { value: leaf_value });
        return idx;
    };
    if score >= parent_sse - 1e-9 {
        // No boundary improves on keeping the node whole.
        nodes.push(TreeNode::Leaf { value: leaf_value });
        return idx;
    }

    let threshold = binned.threshold(feature_idx, split_bin);
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&row| x[row][feature_idx] <= threshold);
    if left_rows.len() < options.min_leaf || right_rows.len() < options.min_leaf {
        nodes.push(TreeNode::Leaf { value: leaf_value });
        return idx;
    }

    nodes.push(TreeNode::Leaf { value: leaf_value }); // placeholder
    let left = grow_node(binned, x, y, left_rows, features, options, depth + 1, nodes);
    let right = grow_node(binned, x, y, right_rows, features, options, depth + 1, nodes);
    nodes[idx as usize] = TreeNode::Split {
        feature_index: feature_idx as u16,
        threshold,
        left,
        right,
    };
    idx
}

#[derive(Debug, Clone, Default)]
pub struct TreeTrainer {
    pub options: TreeOptions,
}

impl Trainer for TreeTrainer {
    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String> {
        if x.is_empty() || y.is_empty() {
            return Err("empty training set".to_string());
        }
        if x.len() != y.len() {
            return Err("mismatched feature/label lengths".to_string());
        }
        let binned = binning::bin_matrix(x, self.options.bins);
        let rows: Vec<usize> = (0..x.len()).collect();
        let features: Vec<usize> = (0..x[0].len()).collect();
        Ok(Regressor::Tree(grow_tree(
            &binned,
            x,
            y,
            rows,
            &features,
            &self.options,
        )))
    }
}
