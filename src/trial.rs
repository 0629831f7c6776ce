//! Candidate trial runner and best-model selection.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Regressor, Trainer, metrics};

/// Scores for one successful candidate, recorded in the training report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialScore {
    pub name: String,
    pub train_r2: f64,
    pub test_r2: f64,
}

/// A candidate that failed to fit; excluded from selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub name: String,
    pub reason: String,
}

/// One successful trial: the fitted model plus its scores.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub name: &'static str,
    pub model: Regressor,
    pub train_r2: f64,
    pub test_r2: f64,
}

/// All trial results for one run.
#[derive(Debug, Clone, Default)]
pub struct TrialBatch {
    pub outcomes: Vec<TrialOutcome>,
    pub failures: Vec<TrialFailure>,
}

impl TrialBatch {
    pub fn scores(&self) -> Vec<TrialScore> {
        self.outcomes
            .iter()
            .map(|o| TrialScore {
                name: o.name.to_string(),
                train_r2: o.train_r2,
                test_r2: o.test_r2,
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no candidate model trained successfully")]
    NoSuccessfulTrials,
    #[error(
        "best candidate {name} scored test R2 {test_r2:.4}, below the quality gate {threshold}"
    )]
    BelowQualityGate {
        name: String,
        test_r2: f64,
        threshold: f64,
    },
}

/// Fit and score every candidate independently.
///
/// A candidate that fails to fit is recorded and skipped; it never aborts
/// the batch. Candidates share no mutable state, so the loop order only
/// matters for the tie break in [`select_best`].
pub fn run_trials(
    trainers: &[Box<dyn Trainer>],
    x_train: &[Vec<f32>],
    y_train: &[f32],
    x_test: &[Vec<f32>],
    y_test: &[f32],
) -> TrialBatch {
    let mut batch = TrialBatch::default();
    for trainer in trainers {
        let name = trainer.name();
        match trainer.fit(x_train, y_train) {
            Ok(model) => {
                let train_r2 = metrics::r_squared(&model.predict_all(x_train), y_train);
                let test_r2 = metrics::r_squared(&model.predict_all(x_test), y_test);
                info!(candidate = name, train_r2, test_r2, "trial complete");
                batch.outcomes.push(TrialOutcome {
                    name,
                    model,
                    train_r2,
                    test_r2,
                });
            }
            Err(reason) => {
                warn!(candidate = name, %reason, "trial failed; excluding candidate");
                batch.failures.push(TrialFailure {
                    name: name.to_string(),
                    reason,
                });
            }
        }
    }
    batch
}

/// Pick the outcome with the highest test R2, ties toward the earlier entry.
///
/// Fails rather than returning a model below `quality_threshold`, carrying
/// the best score achieved for diagnostics.
pub fn select_best(
    outcomes: Vec<TrialOutcome>,
    quality_threshold: f64,
) -> Result<TrialOutcome, SelectError> {
    let mut best: Option<TrialOutcome> = None;
    for outcome in outcomes {
        let better = best
            .as_ref()
            .map(|b| outcome.test_r2 > b.test_r2)
            .unwrap_or(true);
        if better {
            best = Some(outcome);
        }
    }
    let best = best.ok_or(SelectError::NoSuccessfulTrials)?;
    if best.test_r2 < quality_threshold {
        return Err(SelectError::BelowQualityGate {
            name: best.name.to_string(),
            test_r2: best.test_r2,
            threshold: quality_threshold,
        });
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinearModel;

    fn outcome(name: &'static str, test_r2: f64) -> TrialOutcome {
        TrialOutcome {
            name,
            model: Regressor::Linear(LinearModel {
                weights: vec![0.0],
                intercept: 0.0,
            }),
            train_r2: test_r2,
            test_r2,
        }
    }

    #[test]
    fn selects_highest_test_score_above_gate() {
        let outcomes = vec![outcome("a", 0.4), outcome("b", 0.72), outcome("c", 0.55)];
        let best = select_best(outcomes, 0.6).unwrap();
        assert_eq!(best.name, "b");
    }

    #[test]
    fn fails_when_no_candidate_clears_gate() {
        let outcomes = vec![outcome("a", 0.3), outcome("b", 0.4), outcome("c", 0.5)];
        let err = select_best(outcomes, 0.6).unwrap_err();
        match err {
            SelectError::BelowQualityGate { name, test_r2, .. } => {
                assert_eq!(name, "c");
                assert!((test_r2 - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ties_break_toward_earlier_entry() {
        let outcomes = vec![outcome("first", 0.8), outcome("second", 0.8)];
        let best = select_best(outcomes, 0.6).unwrap();
        assert_eq!(best.name, "first");
    }

    #[test]
    fn empty_outcome_list_is_an_error() {
        assert!(matches!(
            select_best(vec![], 0.6),
            Err(SelectError::NoSuccessfulTrials)
        ));
    }

    #[test]
    fn failing_candidate_is_excluded_not_fatal() {
        struct AlwaysFails;
        impl Trainer for AlwaysFails {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn fit(&self, _x: &[Vec<f32>], _y: &[f32]) -> Result<Regressor, String> {
                Err("bad hyperparameters".to_string())
            }
        }
        let trainers: Vec<Box<dyn Trainer>> = vec![
            Box::new(AlwaysFails),
            Box::new(crate::models::LinearTrainer::least_squares()),
        ];
        let x: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32]).collect();
        let y: Vec<f32> = x.iter().map(|r| 3.0 * r[0]).collect();
        let batch = run_trials(&trainers, &x, &y, &x, &y);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].name, "broken");
        assert_eq!(batch.outcomes.len(), 1);
        assert!(batch.outcomes[0].test_r2 > 0.99);
    }
}
