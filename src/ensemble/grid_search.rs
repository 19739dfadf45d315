//! Exhaustive weight search over the discretized simplex
//!
//! The search is a reduction over `(index, tuple)` pairs in canonical order.
//! A candidate replaces the incumbent only with strictly higher accuracy, so
//! the earliest tuple wins ties. The parallel path reduces with the same
//! ordering on `(accuracy desc, index asc)` and returns the same tuple.

use super::config::GridConfig;
use super::inputs::{LabelVector, PredictionMatrix};
use super::result::{FusionResult, FusionStrategy, SearchOutcome};
use super::rounding::RoundingMode;
use super::simplex::{SimplexGrid, WeightTuple};
use super::voting::WeightedVote;
use crate::error::{FusionError, Result};
use crate::utils::ParallelConfig;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Deadline and cancellation checked before each candidate
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
}

impl SearchControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    fn check(&self, start: Instant) -> Result<()> {
        if self.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(FusionError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = start.elapsed();
            if elapsed > timeout {
                return Err(FusionError::DeadlineExceeded {
                    elapsed_secs: elapsed.as_secs_f64(),
                });
            }
        }
        Ok(())
    }
}

/// Best candidate so far; ordered by accuracy, then earliest index
#[derive(Debug, Clone)]
struct Scored {
    index: usize,
    correct: usize,
    weights: WeightTuple,
}

impl Scored {
    /// The better of two candidates, preferring the earlier one on ties
    fn better(a: Option<Scored>, b: Option<Scored>) -> Option<Scored> {
        match (a, b) {
            (Some(a), Some(b)) => {
                let b_wins = b.correct > a.correct || (b.correct == a.correct && b.index < a.index);
                Some(if b_wins { b } else { a })
            }
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Grid search for the accuracy-maximizing weight tuple
#[derive(Debug, Clone, Default)]
pub struct WeightGridSearch {
    grid: GridConfig,
    rounding: RoundingMode,
    parallel: ParallelConfig,
    control: SearchControl,
}

impl WeightGridSearch {
    pub fn new(grid: GridConfig, rounding: RoundingMode) -> Self {
        Self {
            grid,
            rounding,
            parallel: ParallelConfig::default(),
            control: SearchControl::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_control(mut self, control: SearchControl) -> Self {
        self.control = control;
        self
    }

    /// Search space for `n_models` under this grid
    pub fn simplex(&self, n_models: usize) -> Result<SimplexGrid> {
        if let Some(expected) = self.grid.n_models {
            if expected != n_models {
                return Err(FusionError::ShapeMismatch {
                    expected: format!("{} models", expected),
                    actual: format!("{} models", n_models),
                });
            }
        }
        SimplexGrid::new(&self.grid, n_models)
    }

    /// Run the search; all validation happens before the first evaluation
    pub fn search(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<SearchOutcome> {
        predictions.check_aligned(labels)?;
        let simplex = self.simplex(predictions.n_models())?;
        simplex.ensure_non_empty()?;

        let start = Instant::now();
        let vote = WeightedVote::new(self.rounding);

        debug!(
            n_models = simplex.n_models(),
            axis_points = simplex.axis().len(),
            raw_space = ?simplex.raw_size(),
            parallel = self.parallel.enabled,
            "Starting weight grid search"
        );

        let (best, evaluated) = if self.parallel.enabled {
            let pool = self.parallel.build_pool()?;
            pool.install(|| self.search_parallel(&simplex, &vote, predictions, labels, start))?
        } else {
            self.search_sequential(&simplex, &vote, predictions, labels, start)?
        };

        let best = best.ok_or(FusionError::EmptySearchSpace {
            n_models: simplex.n_models(),
            step: self.grid.step,
        })?;

        let fused = vote.predict(predictions, &best.weights)?;
        let outcome = SearchOutcome {
            best: FusionResult {
                strategy: FusionStrategy::WeightedSearch,
                accuracy: best.correct as f64 / labels.len() as f64,
                weights: Some(best.weights),
                predictions: fused,
            },
            best_index: best.index,
            candidates_evaluated: evaluated,
            raw_space_size: simplex.raw_size(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            accuracy = outcome.best.accuracy,
            weights = %outcome.best.weights.as_ref().map(|w| w.to_string()).unwrap_or_default(),
            candidates = outcome.candidates_evaluated,
            elapsed_secs = outcome.elapsed_secs,
            "Weight grid search finished"
        );

        Ok(outcome)
    }

    fn search_sequential(
        &self,
        simplex: &SimplexGrid,
        vote: &WeightedVote,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        start: Instant,
    ) -> Result<(Option<Scored>, usize)> {
        simplex
            .candidates()
            .enumerate()
            .try_fold(
                (None, 0usize),
                |(best, evaluated), (index, weights)| -> Result<(Option<Scored>, usize)> {
                    self.control.check(start)?;
                    let correct = vote.count_correct(predictions, labels, weights.as_slice());
                    let candidate = Scored { index, correct, weights };
                    Ok((Scored::better(best, Some(candidate)), evaluated + 1))
                },
            )
    }

    fn search_parallel(
        &self,
        simplex: &SimplexGrid,
        vote: &WeightedVote,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        start: Instant,
    ) -> Result<(Option<Scored>, usize)> {
        simplex
            .candidates()
            .enumerate()
            .par_bridge()
            .map(|(index, weights)| -> Result<(Option<Scored>, usize)> {
                self.control.check(start)?;
                let correct = vote.count_correct(predictions, labels, weights.as_slice());
                Ok((Some(Scored { index, correct, weights }), 1usize))
            })
            .try_reduce(
                || (None, 0),
                |(a, na), (b, nb)| Ok((Scored::better(a, b), na + nb)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (PredictionMatrix, LabelVector) {
        let preds =
            PredictionMatrix::from_vecs(vec![vec![0.9, 0.1], vec![0.8, 0.2], vec![0.3, 0.7]])
                .unwrap();
        let labels = LabelVector::from_vec(vec![1.0, 0.0]).unwrap();
        (preds, labels)
    }

    #[test]
    fn test_scenario_reaches_full_accuracy() {
        let (preds, labels) = scenario();
        let outcome = WeightGridSearch::default().search(&preds, &labels).unwrap();

        assert!((outcome.accuracy() - 1.0).abs() < 1e-12);
        assert_eq!(outcome.candidates_evaluated, 66);
        assert_eq!(outcome.raw_space_size, Some(1331));
    }

    #[test]
    fn test_ties_keep_first_tuple() {
        let (preds, labels) = scenario();
        let outcome = WeightGridSearch::default().search(&preds, &labels).unwrap();
        let simplex = SimplexGrid::new(&GridConfig::default(), 3).unwrap();
        let vote = WeightedVote::default();

        let first_perfect = simplex
            .candidates()
            .position(|w| vote.count_correct(&preds, &labels, w.as_slice()) == 2)
            .unwrap();
        assert_eq!(outcome.best_index, first_perfect);
    }

    #[test]
    fn test_all_tied_returns_first_candidate() {
        let preds = PredictionMatrix::from_vecs(vec![vec![0.9, 0.1], vec![0.9, 0.1]]).unwrap();
        let labels = LabelVector::from_vec(vec![1.0, 0.0]).unwrap();
        let outcome = WeightGridSearch::default().search(&preds, &labels).unwrap();

        assert_eq!(outcome.best_index, 0);
        assert_eq!(outcome.weights().unwrap().as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let preds = PredictionMatrix::from_vecs(vec![
            vec![0.6, 0.4, 0.55, 0.2, 0.8, 0.45],
            vec![0.3, 0.7, 0.65, 0.1, 0.4, 0.52],
            vec![0.7, 0.2, 0.35, 0.6, 0.9, 0.48],
        ])
        .unwrap();
        let labels = LabelVector::from_vec(vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0]).unwrap();

        let sequential = WeightGridSearch::default().search(&preds, &labels).unwrap();
        let parallel = WeightGridSearch::default()
            .with_parallel(ParallelConfig::new().with_threads(4))
            .search(&preds, &labels)
            .unwrap();

        assert_eq!(sequential.best_index, parallel.best_index);
        assert_eq!(sequential.best.weights, parallel.best.weights);
        assert_eq!(sequential.candidates_evaluated, parallel.candidates_evaluated);
    }

    #[test]
    fn test_shape_mismatch_before_search() {
        let preds = PredictionMatrix::from_vecs(vec![vec![0.9, 0.1], vec![0.8, 0.2]]).unwrap();
        let labels = LabelVector::from_vec(vec![1.0]).unwrap();
        let err = WeightGridSearch::default().search(&preds, &labels).unwrap_err();
        assert!(matches!(err, FusionError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_configured_model_count_must_match() {
        let (preds, labels) = scenario();
        let search = WeightGridSearch::new(GridConfig::new().with_n_models(2), RoundingMode::HalfToEven);
        assert!(matches!(
            search.search(&preds, &labels).unwrap_err(),
            FusionError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_empty_search_space() {
        let (preds, labels) = scenario();
        let search = WeightGridSearch::new(GridConfig::new().with_step(0.3), RoundingMode::HalfToEven);
        assert!(matches!(
            search.search(&preds, &labels).unwrap_err(),
            FusionError::EmptySearchSpace { .. }
        ));
    }

    #[test]
    fn test_cancelled_search_returns_error() {
        let (preds, labels) = scenario();
        let token = CancellationToken::new();
        token.cancel();
        let search = WeightGridSearch::default().with_control(SearchControl::new().with_token(token));
        assert!(matches!(
            search.search(&preds, &labels).unwrap_err(),
            FusionError::Cancelled
        ));
    }

    #[test]
    fn test_expired_deadline() {
        let control = SearchControl::new().with_timeout(Duration::from_millis(10));
        let start = Instant::now().checked_sub(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            control.check(start).unwrap_err(),
            FusionError::DeadlineExceeded { .. }
        ));
        assert!(control.check(Instant::now()).is_ok());
    }

    #[test]
    fn test_best_not_below_equal_weights() {
        let preds = PredictionMatrix::from_vecs(vec![
            vec![0.6, 0.4, 0.55, 0.2],
            vec![0.3, 0.7, 0.65, 0.1],
            vec![0.7, 0.2, 0.35, 0.6],
            vec![0.5, 0.5, 0.9, 0.3],
        ])
        .unwrap();
        let labels = LabelVector::from_vec(vec![1.0, 0.0, 1.0, 0.0]).unwrap();
        let grid = GridConfig::new().with_step(0.25);
        let outcome = WeightGridSearch::new(grid, RoundingMode::HalfToEven)
            .search(&preds, &labels)
            .unwrap();

        let equal = WeightedVote::default()
            .fuse(&preds, &labels, &WeightTuple::equal(4))
            .unwrap();
        assert!(outcome.accuracy() >= equal.accuracy);
    }
}
