//! Scoring functions: the classifier side of the fusion contract
//!
//! A classifier is opaque to the fusion engine. All it must do is map a batch
//! of input rows to one probability per row. Predictions for a whole
//! evaluation set are gathered with [`collect_predictions`], which feeds each
//! scorer fixed-size batches and validates what comes back.

use crate::ensemble::PredictionMatrix;
use crate::error::{FusionError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::debug;

/// A trained binary classifier seen from the outside
pub trait ScoringFunction: Send + Sync {
    /// Display name used in reports
    fn name(&self) -> &str;

    /// Probability of the positive class for every row of `batch`
    fn score(&self, batch: ArrayView2<'_, f64>) -> Result<Array1<f64>>;
}

/// Scorer backed by a closure
pub struct FnScorer<F>
where
    F: Fn(ArrayView2<'_, f64>) -> Array1<f64> + Send + Sync,
{
    name: String,
    f: F,
}

impl<F> FnScorer<F>
where
    F: Fn(ArrayView2<'_, f64>) -> Array1<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> ScoringFunction for FnScorer<F>
where
    F: Fn(ArrayView2<'_, f64>) -> Array1<f64> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, batch: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        Ok((self.f)(batch))
    }
}

/// Linear model followed by a sigmoid
#[derive(Debug, Clone)]
pub struct LogisticScorer {
    name: String,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LogisticScorer {
    pub fn new(name: impl Into<String>, coefficients: Array1<f64>, intercept: f64) -> Self {
        Self {
            name: name.into(),
            coefficients,
            intercept,
        }
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }
}

impl ScoringFunction for LogisticScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, batch: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if batch.ncols() != self.coefficients.len() {
            return Err(FusionError::ShapeMismatch {
                expected: format!("{} features", self.coefficients.len()),
                actual: format!("{} features", batch.ncols()),
            });
        }
        let z = batch.dot(&self.coefficients) + self.intercept;
        Ok(Self::sigmoid(&z))
    }
}

/// Score `inputs` with every scorer in batches of `batch_size` rows.
///
/// The last batch may be shorter. Each scorer must return exactly one finite
/// probability in `[0, 1]` per row.
pub fn collect_predictions(
    scorers: &[&dyn ScoringFunction],
    inputs: &Array2<f64>,
    batch_size: usize,
) -> Result<PredictionMatrix> {
    if scorers.is_empty() {
        return Err(FusionError::InvalidInput("No scoring functions provided".to_string()));
    }
    if batch_size == 0 {
        return Err(FusionError::ConfigError("batch size must be at least 1".to_string()));
    }

    let n_samples = inputs.nrows();
    let columns = scorers
        .iter()
        .map(|scorer| {
            let mut column = Vec::with_capacity(n_samples);
            for (batch_idx, batch) in inputs.axis_chunks_iter(Axis(0), batch_size).enumerate() {
                let scores = scorer.score(batch)?;
                if scores.len() != batch.nrows() {
                    return Err(FusionError::ShapeMismatch {
                        expected: format!("{} scores from '{}'", batch.nrows(), scorer.name()),
                        actual: format!("{} scores in batch {}", scores.len(), batch_idx),
                    });
                }
                column.extend(scores.iter().copied());
            }
            debug!(scorer = scorer.name(), n_samples, batch_size, "Collected predictions");
            Ok(Array1::from_vec(column))
        })
        .collect::<Result<Vec<Array1<f64>>>>()?;

    PredictionMatrix::new(columns)
}

/// Names of `scorers`, in order
pub fn scorer_names(scorers: &[&dyn ScoringFunction]) -> Vec<String> {
    scorers.iter().map(|s| s.name().to_string()).collect()
}
