//! Error types for the ensemble fusion engine

use thiserror::Error;

/// Result type alias for fusion operations
pub type Result<T> = std::result::Result<T, FusionError>;

/// Main error type for the fusion engine
#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty search space: no weight tuple for {n_models} models with step {step} sums to 1")]
    EmptySearchSpace { n_models: usize, step: f64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Search cancelled")]
    Cancelled,

    #[error("Search deadline exceeded after {elapsed_secs:.3}s")]
    DeadlineExceeded { elapsed_secs: f64 },
}

impl FusionError {
    /// Shorthand for a length disagreement between two aligned inputs
    pub fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        FusionError::ShapeMismatch {
            expected: format!("{} of length {}", what, expected),
            actual: format!("length {}", actual),
        }
    }
}

impl From<polars::error::PolarsError> for FusionError {
    fn from(err: polars::error::PolarsError) -> Self {
        FusionError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FusionError {
    fn from(err: serde_json::Error) -> Self {
        FusionError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FusionError {
    fn from(err: ndarray::ShapeError) -> Self {
        FusionError::ShapeMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FusionError::InvalidInput("NaN in model 1".to_string());
        assert_eq!(err.to_string(), "Invalid input: NaN in model 1");
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = FusionError::length_mismatch("labels", 2, 3);
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected labels of length 2, got length 3"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FusionError = io_err.into();
        assert!(matches!(err, FusionError::IoError(_)));
    }
}
