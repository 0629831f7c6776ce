//! Seeded train/test split over row indices.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row-index partition produced by [`train_test_split`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `0..n_rows` into train and held-out subsets.
///
/// The shuffle is driven entirely by `seed`, so the same inputs always
/// produce the same partition. Both subsets are guaranteed non-empty for
/// `n_rows >= 2` and any ratio strictly inside `(0, 1)`.
pub fn train_test_split(
    n_rows: usize,
    holdout_ratio: f32,
    seed: u64,
) -> Result<SplitIndices, String> {
    if !(holdout_ratio > 0.0 && holdout_ratio < 1.0) {
        return Err(format!(
            "holdout ratio {holdout_ratio} must be inside (0, 1)"
        ));
    }
    if n_rows < 2 {
        return Err(format!("need at least 2 rows to split, got {n_rows}"));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let holdout = ((n_rows as f32 * holdout_ratio).round() as usize).clamp(1, n_rows - 1);
    let test = indices[..holdout].to_vec();
    let train = indices[holdout..].to_vec();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn split_is_a_partition() {
        for ratio in [0.1f32, 0.2, 0.5, 0.9] {
            let split = train_test_split(100, ratio, 7).unwrap();
            let mut seen: BTreeSet<usize> = BTreeSet::new();
            for &idx in split.train.iter().chain(&split.test) {
                assert!(seen.insert(idx), "duplicate index {idx} at ratio {ratio}");
            }
            assert_eq!(seen, (0..100).collect::<BTreeSet<_>>());
            assert!(!split.train.is_empty());
            assert!(!split.test.is_empty());
        }
    }

    #[test]
    fn same_seed_same_split() {
        let a = train_test_split(50, 0.2, 42).unwrap();
        let b = train_test_split(50, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_split() {
        let a = train_test_split(50, 0.2, 1).unwrap();
        let b = train_test_split(50, 0.2, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tiny_dataset_keeps_both_sides_non_empty() {
        let split = train_test_split(2, 0.01, 0).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn rejects_bad_ratio() {
        assert!(train_test_split(10, 0.0, 0).is_err());
        assert!(train_test_split(10, 1.0, 0).is_err());
        assert!(train_test_split(10, -0.5, 0).is_err());
    }

    #[test]
    fn rejects_too_few_rows() {
        assert!(train_test_split(1, 0.2, 0).is_err());
    }
}
