//! Evaluation metrics for regression models.

/// Coefficient of determination, computed with f64 accumulation.
///
/// Returns a value in `(-inf, 1]`; a degenerate target column with zero
/// variance scores 1.0 only when predictions are exact.
pub fn r_squared(predictions: &[f32], targets: &[f32]) -> f64 {
    debug_assert_eq!(predictions.len(), targets.len());
    if targets.is_empty() {
        return 0.0;
    }
    let n = targets.len() as f64;
    let mean: f64 = targets.iter().map(|&t| f64::from(t)).sum::<f64>() / n;
    let mut ss_res = 0.0f64;
    let mut ss_tot = 0.0f64;
    for (&p, &t) in predictions.iter().zip(targets) {
        let r = f64::from(t) - f64::from(p);
        ss_res += r * r;
        let d = f64::from(t) - mean;
        ss_tot += d * d;
    }
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { f64::NEG_INFINITY };
    }
    1.0 - ss_res / ss_tot
}

/// Root mean squared error.
pub fn rmse(predictions: &[f32], targets: &[f32]) -> f64 {
    debug_assert_eq!(predictions.len(), targets.len());
    if targets.is_empty() {
        return 0.0;
    }
    let ss: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| {
            let r = f64::from(t) - f64::from(p);
            r * r
        })
        .sum();
    (ss / targets.len() as f64).sqrt()
}

/// Mean absolute error.
pub fn mae(predictions: &[f32], targets: &[f32]) -> f64 {
    debug_assert_eq!(predictions.len(), targets.len());
    if targets.is_empty() {
        return 0.0;
    }
    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| (f64::from(t) - f64::from(p)).abs())
        .sum();
    sum / targets.len() as f64
}
