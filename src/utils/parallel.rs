//! Parallel processing utilities

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for parallel candidate evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Evaluate candidates on a thread pool instead of the calling thread
    pub enabled: bool,
    /// Number of threads (None = use all available)
    pub n_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            n_threads: None,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable parallel execution
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Set number of threads
    pub fn with_threads(mut self, n: usize) -> Self {
        self.enabled = true;
        self.n_threads = Some(n);
        self
    }

    /// Get the number of threads to use
    pub fn num_threads(&self) -> usize {
        self.n_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Build a dedicated pool sized by this configuration
    pub fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads())
            .thread_name(|i| format!("fusion-worker-{}", i))
            .build()
            .map_err(|e| FusionError::ConfigError(format!("thread pool: {}", e)))
    }
}
