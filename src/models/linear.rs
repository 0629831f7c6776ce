//! Closed-form linear regression with an L2 penalty.
//!
//! Solves the centered normal equations with a Cholesky factorization in
//! f64. The `linear` candidate uses a tiny penalty that only guards against
//! the exact collinearity introduced by full one-hot encoding; `ridge` uses
//! a real shrinkage penalty.

use serde::{Deserialize, Serialize};

use super::{Regressor, Trainer};

/// Fitted linear model: `predict(row) = weights . row + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f32>,
    pub intercept: f32,
}

impl LinearModel {
    pub fn predict(&self, row: &[f32]) -> f32 {
        let mut sum = f64::from(self.intercept);
        for (&w, &v) in self.weights.iter().zip(row) {
            sum += f64::from(w) * f64::from(v);
        }
        sum as f32
    }
}

/// Trainer for both the `linear` and `ridge` registry entries.
#[derive(Debug, Clone)]
pub struct LinearTrainer {
    name: &'static str,
    l2: f64,
}

impl LinearTrainer {
    pub fn least_squares() -> Self {
        Self {
            name: "linear",
            l2: 1e-3,
        }
    }

    pub fn ridge() -> Self {
        Self {
            name: "ridge",
            l2: 1.0,
        }
    }
}

impl Trainer for LinearTrainer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn fit(&self, x: &[Vec<f32>], y: &[f32]) -> Result<Regressor, String> {
        if x.is_empty() || y.is_empty() {
            return Err("empty training set".to_string());
        }
        if x.len() != y.len() {
            return Err("mismatched feature/label lengths".to_string());
        }
        let n = x.len();
        let d = x[0].len();
        if x.iter().any(|row| row.len() != d) {
            return Err("inconsistent feature row length".to_string());
        }

        let mut x_mean = vec![0.0f64; d];
        for row in x {
            for (m, &v) in x_mean.iter_mut().zip(row) {
                *m += f64::from(v);
            }
        }
        for m in &mut x_mean {
            *m /= n as f64;
        }
        let y_mean: f64 = y.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;

        // Centered Gram matrix and right-hand side.
        let mut gram = vec![vec![0.0f64; d]; d];
        let mut rhs = vec![0.0f64; d];
        let mut centered = vec![0.0f64; d];
        for (row, &label) in x.iter().zip(y) {
            for j in 0..d {
                centered[j] = f64::from(row[j]) - x_mean[j];
            }
            let dy = f64::from(label) - y_mean;
            for j in 0..d {
                rhs[j] += centered[j] * dy;
                for k in j..d {
                    gram[j][k] += centered[j] * centered[k];
                }
            }
        }
        for j in 0..d {
            for k in 0..j {
                gram[j][k] = gram[k][j];
            }
            gram[j][j] += self.l2;
        }

        let solution = cholesky_solve(gram, rhs)?;
        let intercept = y_mean
            - solution
                .iter()
                .zip(&x_mean)
                .map(|(&w, &m)| w * m)
                .sum::<f64>();
        Ok(Regressor::Linear(LinearModel {
            weights: solution.into_iter().map(|w| w as f32).collect(),
            intercept: intercept as f32,
        }))
    }
}

/// Solve `a * x = b` for symmetric positive definite `a`.
fn cholesky_solve(mut a: Vec<Vec<f64>>, b: Vec<f64>) -> Result<Vec<f64>, String> {
    let d = b.len();
    // In-place lower-triangular factorization.
    for j in 0..d {
        for k in 0..j {
            let l = a[j][k];
            for i in j..d {
                a[i][j] -= a[i][k] * l;
            }
        }
        let pivot = a[j][j];
        if pivot <= 1e-12 {
            return Err("gram matrix is not positive definite".to_string());
        }
        let root = pivot.sqrt();
        for i in j..d {
            a[i][j] /= root;
        }
    }
    // Forward substitution: L z = b.
    let mut z = b;
    for j in 0..d {
        for k in 0..j {
            z[j] -= a[j][k] * z[k];
        }
        z[j] /= a[j][j];
    }
    // Back substitution: L' x = z.
    for j in (0..d).rev() {
        for k in (j + 1)..d {
            z[j] -= a[k][j] * z[k];
        }
        z[j] /= a[j][j];
    }
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_known_coefficients() {
        // y = 2*a - 3*b + 5, exactly.
        let x: Vec<Vec<f32>> = (0..20)
            .map(|i| vec![i as f32, (i % 7) as f32])
            .collect();
        let y: Vec<f32> = x.iter().map(|r| 2.0 * r[0] - 3.0 * r[1] + 5.0).collect();
        let model = LinearTrainer::least_squares().fit(&x, &y).unwrap();
        let Regressor::Linear(model) = &model else {
            panic!("expected a linear model");
        };
        assert!((model.weights[0] - 2.0).abs() < 1e-2);
        assert!((model.weights[1] + 3.0).abs() < 1e-2);
        assert!((model.intercept - 5.0).abs() < 0.2);
    }

    #[test]
    fn tolerates_collinear_one_hot_columns() {
        // Columns 1 and 2 always sum to one, like a full one-hot pair.
        let x: Vec<Vec<f32>> = (0..10)
            .map(|i| {
                let flag = (i % 2) as f32;
                vec![i as f32, flag, 1.0 - flag]
            })
            .collect();
        let y: Vec<f32> = x.iter().map(|r| r[0] + r[1]).collect();
        let model = LinearTrainer::least_squares().fit(&x, &y).unwrap();
        let preds: Vec<f32> = x.iter().map(|r| model.predict(r)).collect();
        for (&p, &t) in preds.iter().zip(&y) {
            assert!((p - t).abs() < 0.1, "predicted {p}, expected {t}");
        }
    }

    #[test]
    fn ridge_shrinks_weights() {
        let x: Vec<Vec<f32>> = (0..20).map(|i| vec![i as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| 4.0 * r[0]).collect();
        let ls = LinearTrainer::least_squares().fit(&x, &y).unwrap();
        let ridge = LinearTrainer::ridge().fit(&x, &y).unwrap();
        let (Regressor::Linear(ls), Regressor::Linear(ridge)) = (&ls, &ridge) else {
            panic!("expected linear models");
        };
        assert!(ridge.weights[0].abs() < ls.weights[0].abs());
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(LinearTrainer::least_squares().fit(&[], &[]).is_err());
        let x = vec![vec![1.0f32], vec![2.0, 3.0]];
        let y = vec![1.0f32, 2.0];
        assert!(LinearTrainer::least_squares().fit(&x, &y).is_err());
    }

    #[test]
    fn cholesky_solves_identity() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let x = cholesky_solve(a, vec![3.0, -4.0]).unwrap();
        assert!((x[0] - 3.0).abs() < 1e-12);
        assert!((x[1] + 4.0).abs() < 1e-12);
    }
}
