//! Ensemble fusion module
//!
//! Combines the probabilities of independently trained binary classifiers:
//! - Majority (hard) voting with an explicit tie-break
//! - Weighted (soft) voting with fixed weights
//! - Exhaustive grid search over the discretized weight simplex
//! - Per-model baselines and an aggregate report

mod config;
mod engine;
mod grid_search;
mod inputs;
mod result;
mod rounding;
mod simplex;
mod voting;

pub use config::{FusionConfig, GridConfig};
pub use engine::{FusionEngine, FusionReport};
pub use grid_search::{CancellationToken, SearchControl, WeightGridSearch};
pub use inputs::{accuracy, LabelVector, PredictionMatrix};
pub use result::{FusionResult, FusionStrategy, SearchOutcome};
pub use rounding::{RoundingMode, VoteTieBreak};
pub use simplex::{Candidates, SimplexGrid, WeightTuple};
pub use voting::{MajorityVote, WeightedVote};
