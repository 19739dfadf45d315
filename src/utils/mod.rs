//! Utility functions and types

mod parallel;
pub mod data_loader;

pub use data_loader::{save_prediction_table, PredictionLoader, PredictionTable};
pub use parallel::ParallelConfig;
