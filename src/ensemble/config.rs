//! Fusion configuration

use super::rounding::{RoundingMode, VoteTieBreak};
use crate::error::{FusionError, Result};
use crate::utils::ParallelConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Discretization of the weight simplex searched by the weighted fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance between neighbouring points on each weight axis
    pub step: f64,
    /// Expected number of models (None = taken from the predictions)
    pub n_models: Option<usize>,
    /// Absolute tolerance for "sums to one"
    pub abs_tolerance: f64,
    /// Relative tolerance for "sums to one"
    pub rel_tolerance: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            n_models: None,
            abs_tolerance: 1e-8,
            rel_tolerance: 1e-5,
        }
    }
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the axis step
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Builder method to pin the number of models
    pub fn with_n_models(mut self, n: usize) -> Self {
        self.n_models = Some(n);
        self
    }

    /// Builder method to set both tolerances
    pub fn with_tolerance(mut self, abs_tolerance: f64, rel_tolerance: f64) -> Self {
        self.abs_tolerance = abs_tolerance;
        self.rel_tolerance = rel_tolerance;
        self
    }

    /// `|a - b| <= abs + rel * |b|`
    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.abs_tolerance + self.rel_tolerance * b.abs()
    }

    /// Axis points `0, step, 2*step, ...` not exceeding 1 (within tolerance)
    pub fn axis(&self) -> Vec<f64> {
        let mut points = Vec::new();
        let mut i = 0usize;
        loop {
            let v = i as f64 * self.step;
            if v > 1.0 && !self.is_close(v, 1.0) {
                break;
            }
            points.push(if self.is_close(v, 1.0) { 1.0 } else { v });
            i += 1;
        }
        points
    }

    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 || self.step > 1.0 {
            return Err(FusionError::ConfigError(format!(
                "grid step must be in (0, 1], got {}",
                self.step
            )));
        }
        if !(self.abs_tolerance >= 0.0) || !(self.rel_tolerance >= 0.0) {
            return Err(FusionError::ConfigError(
                "grid tolerances must be non-negative".to_string(),
            ));
        }
        if self.step <= 2.0 * (self.abs_tolerance + self.rel_tolerance) {
            return Err(FusionError::ConfigError(format!(
                "grid step {} is not larger than the sum tolerance",
                self.step
            )));
        }
        if self.n_models == Some(0) {
            return Err(FusionError::ConfigError(
                "grid needs at least one model".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the fusion engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Probability-to-label rounding shared by every fusion rule
    pub rounding: RoundingMode,
    /// Majority vote tie-break for an even number of models
    pub tie_break: VoteTieBreak,
    /// Weight search discretization
    pub grid: GridConfig,
    /// Parallel candidate evaluation
    pub parallel: ParallelConfig,
    /// Maximum wall time for the weight search
    pub timeout_secs: Option<f64>,
}

impl FusionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_tie_break(mut self, tie_break: VoteTieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if let Some(t) = self.timeout_secs {
            if !t.is_finite() || t <= 0.0 || Duration::try_from_secs_f64(t).is_err() {
                return Err(FusionError::ConfigError(format!(
                    "timeout must be a positive, representable number of seconds, got {}",
                    t
                )));
            }
        }
        if self.parallel.n_threads == Some(0) {
            return Err(FusionError::ConfigError(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
