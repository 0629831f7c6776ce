//! Shared binned split search for the tree-based candidates.
//!
//! Features are quantized once into at most 256 bins; split candidates are
//! then scored with a single prefix scan per feature using the total sum of
//! squared errors of the two sides.

/// Quantized view of a feature matrix.
#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    pub mins: Vec<f32>,
    pub maxs: Vec<f32>,
    pub bins: usize,
    /// Row-major bin indices, same shape as the source matrix.
    pub rows: Vec<Vec<u8>>,
}

/// Best split for one feature, found by [`best_split_for_feature`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct BestSplit {
    /// Combined SSE of both sides; lower is better.
    pub score: f64,
    pub split_bin: usize,
}

pub(crate) fn bin_matrix(x: &[Vec<f32>], bins: usize) -> BinnedMatrix {
    let bins = bins.clamp(2, 256);
    let width = x.first().map(|row| row.len()).unwrap_or(0);

    let mut mins = vec![f32::INFINITY; width];
    let mut maxs = vec![f32::NEG_INFINITY; width];
    for row in x {
        for (j, &v) in row.iter().enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..width {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }

    let bins_f = bins as f32;
    let mut rows = Vec::with_capacity(x.len());
    for row in x {
        let mut binned = Vec::with_capacity(width);
        for j in 0..width {
            let v = row.get(j).copied().unwrap_or(0.0);
            let t = ((v - mins[j]) / (maxs[j] - mins[j])).clamp(0.0, 1.0);
            binned.push((t * (bins_f - 1.0)).round() as u8);
        }
        rows.push(binned);
    }

    BinnedMatrix {
        mins,
        maxs,
        bins,
        rows,
    }
}

impl BinnedMatrix {
    /// Real-valued cut between `split_bin` and `split_bin + 1`.
    ///
    /// Bins are assigned with `round(t * (bins - 1))`, so bin `b` covers
    /// `t` in `[(b - 0.5) / (bins - 1), (b + 0.5) / (bins - 1))`. The cut
    /// uses the same edge so the `<=` partition on raw values agrees with
    /// the binned statistics that scored the split.
    pub fn threshold(&self, feature_idx: usize, split_bin: usize) -> f32 {
        let t = (split_bin as f32 + 0.5) / (self.bins - 1) as f32;
        self.mins[feature_idx] + t * (self.maxs[feature_idx] - self.mins[feature_idx])
    }
}

/// Scan every bin boundary of one feature over the given row subset.
///
/// Returns `None` when no boundary leaves rows on both sides.
pub(crate) fn best_split_for_feature(
    binned: &BinnedMatrix,
    targets: &[f32],
    row_subset: &[usize],
    feature_idx: usize,
) -> Option<BestSplit> {
    let bins = binned.bins;
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f64; bins];
    let mut sums_sq = vec![0f64; bins];
    for &row in row_subset {
        let b = binned.rows[row][feature_idx] as usize;
        let t = f64::from(targets[row]);
        counts[b] += 1;
        sums[b] += t;
        sums_sq[b] += t * t;
    }
    let total_count: u32 = counts.iter().sum();
    if total_count == 0 {
        return None;
    }
    let total_sum: f64 = sums.iter().sum();
    let total_sum_sq: f64 = sums_sq.iter().sum();

    let mut best: Option<BestSplit> = None;
    let mut left_count = 0u32;
    let mut left_sum = 0f64;
    let mut left_sum_sq = 0f64;
    for split_bin in 0..(bins - 1) {
        left_count += counts[split_bin];
        left_sum += sums[split_bin];
        left_sum_sq += sums_sq[split_bin];
        let right_count = total_count - left_count;
        if left_count == 0 || right_count == 0 {
            continue;
        }
        let right_sum = total_sum - left_sum;
        let right_sum_sq = total_sum_sq - left_sum_sq;
        let left_sse = left_sum_sq - (left_sum * left_sum) / f64::from(left_count);
        let right_sse = right_sum_sq - (right_sum * right_sum) / f64::from(right_count);
        let score = left_sse + right_sse;
        if best.map(|b| score < b.score).unwrap_or(true) {
            best = Some(BestSplit { score, split_bin });
        }
    }
    best
}

/// Sum of squared errors around the subset mean, for split-gain comparison.
pub(crate) fn subset_sse(targets: &[f32], row_subset: &[usize]) -> f64 {
    if row_subset.is_empty() {
        return 0.0;
    }
    let n = row_subset.len() as f64;
    let sum: f64 = row_subset.iter().map(|&r| f64::from(targets[r])).sum();
    let sum_sq: f64 = row_subset
        .iter()
        .map(|&r| {
            let t = f64::from(targets[r]);
            t * t
        })
        .sum();
    sum_sq - (sum * sum) / n
}

/// Mean target value over the subset.
pub(crate) fn subset_mean(targets: &[f32], row_subset: &[usize]) -> f32 {
    if row_subset.is_empty() {
        return 0.0;
    }
    let sum: f64 = row_subset.iter().map(|&r| f64::from(targets[r])).sum();
    (sum / row_subset.len() as f64) as f32
}
