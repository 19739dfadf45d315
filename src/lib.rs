//! Ensemble Fusion - decision fusion for binary classifier ensembles
//!
//! Takes the probability outputs of several independently trained binary
//! classifiers and fuses them into one decision:
//! - majority vote over rounded predictions
//! - weighted vote, with the weights found by exhaustive search over a
//!   discretized simplex
//!
//! # Modules
//!
//! - [`ensemble`] - Fusion rules, weight search and the [`FusionEngine`]
//! - [`scoring`] - The [`ScoringFunction`] contract classifiers implement
//! - [`synthetic`] - Seeded synthetic evaluation sets
//! - [`utils`] - Prediction table I/O and parallel configuration
//! - [`cli`] - Command-line interface

pub mod error;

pub mod ensemble;
pub mod scoring;
pub mod synthetic;
pub mod utils;

pub mod cli;

pub use ensemble::FusionEngine;
pub use error::{FusionError, Result};
pub use scoring::ScoringFunction;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ensemble::{
        CancellationToken, FusionConfig, FusionEngine, FusionReport, FusionResult, GridConfig,
        LabelVector, PredictionMatrix, RoundingMode, SearchOutcome, VoteTieBreak, WeightTuple,
    };
    pub use crate::error::{FusionError, Result};
    pub use crate::scoring::{collect_predictions, FnScorer, LogisticScorer, ScoringFunction};
    pub use crate::utils::{ParallelConfig, PredictionLoader};
}
