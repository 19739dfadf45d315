//! Fusion outcome records

use super::simplex::WeightTuple;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule produced a [`FusionResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Rounded predictions of a single model
    Single { model: usize },
    /// Most frequent rounded label
    MajorityVote,
    /// Weighted sum with caller-supplied weights
    FixedWeights,
    /// Best weights found by the simplex grid search
    WeightedSearch,
}

impl fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionStrategy::Single { model } => write!(f, "model {}", model),
            FusionStrategy::MajorityVote => write!(f, "majority vote"),
            FusionStrategy::FixedWeights => write!(f, "fixed weights"),
            FusionStrategy::WeightedSearch => write!(f, "weighted search"),
        }
    }
}

/// Accuracy of one fusion rule, with the weights it used if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub strategy: FusionStrategy,
    /// Fraction of samples classified correctly
    pub accuracy: f64,
    /// Weights for weighted fusion; `None` for majority vote
    pub weights: Option<WeightTuple>,
    /// Fused label per sample
    pub predictions: Vec<u8>,
}

impl FusionResult {
    pub fn n_correct(&self, n_samples: usize) -> usize {
        (self.accuracy * n_samples as f64).round() as usize
    }
}

/// Outcome of the weight grid search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best tuple and its accuracy
    pub best: FusionResult,
    /// Position of the best tuple in canonical order
    pub best_index: usize,
    /// Valid tuples evaluated
    pub candidates_evaluated: usize,
    /// Size of the unfiltered Cartesian product
    pub raw_space_size: Option<u128>,
    pub elapsed_secs: f64,
}

impl SearchOutcome {
    pub fn accuracy(&self) -> f64 {
        self.best.accuracy
    }

    pub fn weights(&self) -> Option<&WeightTuple> {
        self.best.weights.as_ref()
    }
}
