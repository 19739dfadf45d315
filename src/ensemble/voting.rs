//! Voting rules: majority (hard) vote and weighted (soft) vote

use super::inputs::{accuracy, LabelVector, PredictionMatrix};
use super::result::{FusionResult, FusionStrategy};
use super::rounding::{RoundingMode, VoteTieBreak};
use super::simplex::WeightTuple;
use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hard voting: each model casts its rounded label, the most frequent wins
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MajorityVote {
    rounding: RoundingMode,
    tie_break: VoteTieBreak,
}

impl MajorityVote {
    pub fn new(rounding: RoundingMode, tie_break: VoteTieBreak) -> Self {
        Self { rounding, tie_break }
    }

    /// Fused label per sample
    pub fn predict(&self, predictions: &PredictionMatrix) -> Vec<u8> {
        let n_models = predictions.n_models();
        (0..predictions.n_samples())
            .map(|i| {
                let positives = predictions
                    .models()
                    .iter()
                    .filter(|m| self.rounding.to_label(m[i]) == 1)
                    .count();
                self.tie_break.resolve(positives, n_models)
            })
            .collect()
    }

    /// Majority labels scored against `labels`
    pub fn fuse(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<FusionResult> {
        predictions.check_aligned(labels)?;

        let fused = self.predict(predictions);
        let acc = accuracy(&fused, labels);
        debug!(
            n_models = predictions.n_models(),
            n_samples = predictions.n_samples(),
            accuracy = acc,
            "Majority vote evaluated"
        );

        Ok(FusionResult {
            strategy: FusionStrategy::MajorityVote,
            accuracy: acc,
            weights: None,
            predictions: fused,
        })
    }
}

/// Soft voting: weighted sum of probabilities, rounded to a label
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WeightedVote {
    rounding: RoundingMode,
}

impl WeightedVote {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Weighted score of sample `i`, summed in model order
    #[inline]
    fn fused_score(predictions: &PredictionMatrix, weights: &[f64], i: usize) -> f64 {
        predictions
            .models()
            .iter()
            .zip(weights.iter())
            .map(|(m, &w)| w * m[i])
            .sum()
    }

    /// Weighted scores before rounding
    pub fn scores(&self, predictions: &PredictionMatrix, weights: &WeightTuple) -> Result<Vec<f64>> {
        check_weight_count(predictions, weights)?;
        let w = weights.as_slice();
        Ok((0..predictions.n_samples())
            .map(|i| Self::fused_score(predictions, w, i))
            .collect())
    }

    /// Fused label per sample
    pub fn predict(&self, predictions: &PredictionMatrix, weights: &WeightTuple) -> Result<Vec<u8>> {
        Ok(self
            .scores(predictions, weights)?
            .into_iter()
            .map(|s| self.rounding.to_label(s))
            .collect())
    }

    /// Weighted labels scored against `labels`
    pub fn fuse(
        &self,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        weights: &WeightTuple,
    ) -> Result<FusionResult> {
        predictions.check_aligned(labels)?;

        let fused = self.predict(predictions, weights)?;
        let acc = accuracy(&fused, labels);
        debug!(weights = %weights, accuracy = acc, "Weighted vote evaluated");

        Ok(FusionResult {
            strategy: FusionStrategy::FixedWeights,
            accuracy: acc,
            weights: Some(weights.clone()),
            predictions: fused,
        })
    }

    /// Correct-label count without materializing the fused vector.
    ///
    /// Callers must have checked alignment and weight count.
    pub(crate) fn count_correct(
        &self,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        weights: &[f64],
    ) -> usize {
        labels
            .as_array()
            .iter()
            .enumerate()
            .filter(|(i, &label)| {
                self.rounding.to_label(Self::fused_score(predictions, weights, *i)) == label
            })
            .count()
    }
}

pub(crate) fn check_weight_count(predictions: &PredictionMatrix, weights: &WeightTuple) -> Result<()> {
    if weights.len() != predictions.n_models() {
        return Err(FusionError::ShapeMismatch {
            expected: format!("{} weights", predictions.n_models()),
            actual: format!("{} weights", weights.len()),
        });
    }
    Ok(())
}
