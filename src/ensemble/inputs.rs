//! Validated fusion inputs: per-model probabilities and ground-truth labels

use crate::error::{FusionError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Probabilities from N classifiers over the same ordered samples.
///
/// Every column has the same length and every entry is a finite value in
/// `[0, 1]`. Construction fails eagerly otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct PredictionMatrix {
    models: Vec<Array1<f64>>,
}

impl PredictionMatrix {
    /// Build from one probability vector per model
    pub fn new(models: Vec<Array1<f64>>) -> Result<Self> {
        if models.is_empty() {
            return Err(FusionError::InvalidInput(
                "No model predictions provided".to_string(),
            ));
        }

        let n_samples = models[0].len();
        if let Some((idx, bad)) = models
            .iter()
            .enumerate()
            .find(|(_, m)| m.len() != n_samples)
        {
            let lengths: Vec<usize> = models.iter().map(|m| m.len()).collect();
            return Err(FusionError::ShapeMismatch {
                expected: format!("{} samples for every model", n_samples),
                actual: format!(
                    "model {} has {} samples (lengths {:?})",
                    idx,
                    bad.len(),
                    lengths
                ),
            });
        }

        if n_samples == 0 {
            return Err(FusionError::InvalidInput(
                "Predictions contain no samples".to_string(),
            ));
        }

        for (model_idx, model) in models.iter().enumerate() {
            if let Some((sample_idx, &p)) = model
                .iter()
                .enumerate()
                .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
            {
                return Err(FusionError::InvalidInput(format!(
                    "model {} sample {}: probability {} is not a finite value in [0, 1]",
                    model_idx, sample_idx, p
                )));
            }
        }

        Ok(Self { models })
    }

    /// Build from plain vectors
    pub fn from_vecs(models: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(models.into_iter().map(Array1::from_vec).collect())
    }

    /// Build from a `samples x models` matrix
    pub fn from_array2(matrix: &Array2<f64>) -> Result<Self> {
        Self::new(matrix.columns().into_iter().map(|c| c.to_owned()).collect())
    }

    pub fn n_models(&self) -> usize {
        self.models.len()
    }

    pub fn n_samples(&self) -> usize {
        self.models[0].len()
    }

    /// Probabilities of a single model
    pub fn model(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.models[idx].view()
    }

    pub fn models(&self) -> &[Array1<f64>] {
        &self.models
    }

    /// Check that `labels` is aligned with these predictions
    pub fn check_aligned(&self, labels: &LabelVector) -> Result<()> {
        if labels.len() != self.n_samples() {
            return Err(FusionError::length_mismatch(
                "labels",
                self.n_samples(),
                labels.len(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<f64>>> for PredictionMatrix {
    type Error = FusionError;

    fn try_from(models: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_vecs(models)
    }
}

impl From<PredictionMatrix> for Vec<Vec<f64>> {
    fn from(matrix: PredictionMatrix) -> Self {
        matrix.models.into_iter().map(|m| m.to_vec()).collect()
    }
}

/// Binary ground-truth labels, one per sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct LabelVector {
    labels: Array1<u8>,
}

impl LabelVector {
    /// Build from numeric labels; each must be exactly 0 or 1
    pub fn new(labels: Array1<f64>) -> Result<Self> {
        let mut out = Array1::zeros(labels.len());
        for (i, &v) in labels.iter().enumerate() {
            out[i] = if v == 0.0 {
                0
            } else if v == 1.0 {
                1
            } else {
                return Err(FusionError::InvalidInput(format!(
                    "label {} at sample {} is not 0 or 1",
                    v, i
                )));
            };
        }
        Self::from_binary(out)
    }

    /// Build from already-binary labels
    pub fn from_binary(labels: Array1<u8>) -> Result<Self> {
        if labels.is_empty() {
            return Err(FusionError::InvalidInput("Label vector is empty".to_string()));
        }
        if let Some((i, &v)) = labels.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(FusionError::InvalidInput(format!(
                "label {} at sample {} is not 0 or 1",
                v, i
            )));
        }
        Ok(Self { labels })
    }

    pub fn from_vec(labels: Vec<f64>) -> Result<Self> {
        Self::new(Array1::from_vec(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_array(&self) -> &Array1<u8> {
        &self.labels
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

impl TryFrom<Vec<u8>> for LabelVector {
    type Error = FusionError;

    fn try_from(labels: Vec<u8>) -> Result<Self> {
        Self::from_binary(Array1::from_vec(labels))
    }
}

impl From<LabelVector> for Vec<u8> {
    fn from(labels: LabelVector) -> Self {
        labels.labels.to_vec()
    }
}

/// Fraction of positions where `predicted` equals `labels`
pub fn accuracy(predicted: &[u8], labels: &LabelVector) -> f64 {
    let correct = predicted
        .iter()
        .zip(labels.as_array().iter())
        .filter(|(p, l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}
