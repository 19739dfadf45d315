//! Synthetic evaluation sets
//!
//! Generates a linearly separable binary problem plus a panel of imperfect
//! logistic scorers whose coefficients are noisy copies of the true boundary.
//! Used by the `demo` command and by tests that need more than a handful of
//! samples.

use crate::ensemble::LabelVector;
use crate::error::{FusionError, Result};
use crate::scoring::LogisticScorer;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Configuration for a synthetic evaluation set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_models: usize,
    /// Fraction of labels flipped after thresholding
    pub label_noise: f64,
    /// Scale of the per-model coefficient perturbation
    pub model_noise: f64,
    /// Slope applied to every scorer's logit
    pub sharpness: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_samples: 500,
            n_features: 8,
            n_models: 3,
            label_noise: 0.05,
            model_noise: 0.8,
            sharpness: 3.0,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    pub fn with_samples(mut self, n: usize) -> Self {
        self.n_samples = n;
        self
    }

    pub fn with_models(mut self, n: usize) -> Self {
        self.n_models = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_samples == 0 || self.n_features == 0 || self.n_models == 0 {
            return Err(FusionError::ConfigError(
                "synthetic set needs samples, features and models".to_string(),
            ));
        }
        if !(0.0..=0.5).contains(&self.label_noise) {
            return Err(FusionError::ConfigError(format!(
                "label noise must be in [0, 0.5], got {}",
                self.label_noise
            )));
        }
        Ok(())
    }
}

/// Inputs, labels and scorers for one synthetic run
pub struct SyntheticEnsemble {
    pub inputs: Array2<f64>,
    pub labels: LabelVector,
    pub scorers: Vec<LogisticScorer>,
}

impl SyntheticEnsemble {
    pub fn generate(config: &SyntheticConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);

        let truth: Array1<f64> = (0..config.n_features)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        let inputs = Array2::from_shape_fn((config.n_samples, config.n_features), |_| {
            rng.gen_range(-1.0..1.0)
        });

        let labels: Array1<u8> = inputs
            .dot(&truth)
            .iter()
            .map(|&z| {
                let label = u8::from(z > 0.0);
                if rng.gen_bool(config.label_noise) {
                    1 - label
                } else {
                    label
                }
            })
            .collect();

        let scorers = (0..config.n_models)
            .map(|k| {
                let coefficients = truth.mapv(|w| {
                    config.sharpness * (w + rng.gen_range(-config.model_noise..=config.model_noise))
                });
                let intercept = rng.gen_range(-0.2..0.2);
                LogisticScorer::new(format!("model_{}", k), coefficients, intercept)
            })
            .collect();

        Ok(Self {
            inputs,
            labels: LabelVector::from_binary(labels)?,
            scorers,
        })
    }
}
