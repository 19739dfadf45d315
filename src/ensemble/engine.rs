//! Fusion engine: runs every fusion rule over one evaluation set

use super::config::FusionConfig;
use super::grid_search::{CancellationToken, SearchControl, WeightGridSearch};
use super::inputs::{accuracy, LabelVector, PredictionMatrix};
use super::result::{FusionResult, FusionStrategy, SearchOutcome};
use super::simplex::{SimplexGrid, WeightTuple};
use super::voting::{MajorityVote, WeightedVote};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the engine reports for one evaluation set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionReport {
    pub n_models: usize,
    pub n_samples: usize,
    /// Optional display names, one per model
    pub model_names: Vec<String>,
    /// Rounded accuracy of each model on its own
    pub baselines: Vec<FusionResult>,
    pub majority_vote: FusionResult,
    /// Equal-weight soft vote
    pub soft_vote: FusionResult,
    pub weighted_search: SearchOutcome,
}

impl FusionReport {
    /// Best single-model accuracy
    pub fn best_baseline(&self) -> Option<&FusionResult> {
        self.baselines
            .iter()
            .max_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Decision fusion over N binary classifiers
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
    token: Option<CancellationToken>,
}

impl FusionEngine {
    /// Create an engine; the configuration is validated here
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, token: None })
    }

    /// Attach a cancellation token observed by the weight search
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Search space implied by the configuration for `n_models`
    pub fn search_space(&self, n_models: usize) -> Result<SimplexGrid> {
        self.grid_search().simplex(n_models)
    }

    /// Majority vote over rounded model predictions
    pub fn majority_vote(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<FusionResult> {
        MajorityVote::new(self.config.rounding, self.config.tie_break).fuse(predictions, labels)
    }

    /// Accuracy of a caller-supplied weight tuple
    pub fn evaluate_weights(
        &self,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        weights: &WeightTuple,
    ) -> Result<FusionResult> {
        WeightedVote::new(self.config.rounding).fuse(predictions, labels, weights)
    }

    /// Equal-weight average of the model probabilities
    pub fn soft_vote(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<FusionResult> {
        self.evaluate_weights(predictions, labels, &WeightTuple::equal(predictions.n_models()))
    }

    /// Each model's own rounded accuracy, in model order
    pub fn baselines(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<Vec<FusionResult>> {
        predictions.check_aligned(labels)?;
        Ok((0..predictions.n_models())
            .map(|k| {
                let fused: Vec<u8> = predictions
                    .model(k)
                    .iter()
                    .map(|&p| self.config.rounding.to_label(p))
                    .collect();
                FusionResult {
                    strategy: FusionStrategy::Single { model: k },
                    accuracy: accuracy(&fused, labels),
                    weights: None,
                    predictions: fused,
                }
            })
            .collect())
    }

    /// Best weight tuple on the configured simplex grid
    pub fn weighted_search(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<SearchOutcome> {
        self.grid_search().search(predictions, labels)
    }

    /// Run every fusion rule. Inputs and the search space are validated
    /// before any accuracy is computed.
    pub fn fuse(&self, predictions: &PredictionMatrix, labels: &LabelVector) -> Result<FusionReport> {
        self.fuse_named(predictions, labels, Vec::new())
    }

    /// As [`fuse`](Self::fuse), labelling models in the report
    pub fn fuse_named(
        &self,
        predictions: &PredictionMatrix,
        labels: &LabelVector,
        model_names: Vec<String>,
    ) -> Result<FusionReport> {
        predictions.check_aligned(labels)?;
        self.search_space(predictions.n_models())?.ensure_non_empty()?;

        let positives = labels.positives();
        if positives == 0 || positives == labels.len() {
            warn!(
                n_samples = labels.len(),
                positives,
                "Labels contain a single class; accuracy is not informative"
            );
        }

        let baselines = self.baselines(predictions, labels)?;
        let majority_vote = self.majority_vote(predictions, labels)?;
        let soft_vote = self.soft_vote(predictions, labels)?;
        let weighted_search = self.weighted_search(predictions, labels)?;

        info!(
            majority_accuracy = majority_vote.accuracy,
            soft_accuracy = soft_vote.accuracy,
            weighted_accuracy = weighted_search.accuracy(),
            "Fusion complete"
        );

        Ok(FusionReport {
            n_models: predictions.n_models(),
            n_samples: predictions.n_samples(),
            model_names,
            baselines,
            majority_vote,
            soft_vote,
            weighted_search,
        })
    }

    fn grid_search(&self) -> WeightGridSearch {
        let mut control = SearchControl::new();
        if let Some(timeout) = self
            .config
            .timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            control = control.with_timeout(timeout);
        }
        if let Some(token) = &self.token {
            control = control.with_token(token.clone());
        }
        WeightGridSearch::new(self.config.grid.clone(), self.config.rounding)
            .with_parallel(self.config.parallel.clone())
            .with_control(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::config::GridConfig;
    use crate::error::FusionError;

    fn scenario() -> (PredictionMatrix, LabelVector) {
        let preds =
            PredictionMatrix::from_vecs(vec![vec![0.9, 0.1], vec![0.8, 0.2], vec![0.3, 0.7]])
                .unwrap();
        let labels = LabelVector::from_vec(vec![1.0, 0.0]).unwrap();
        (preds, labels)
    }

    #[test]
    fn test_fuse_scenario() {
        let (preds, labels) = scenario();
        let engine = FusionEngine::default();
        let report = engine.fuse(&preds, &labels).unwrap();

        assert_eq!(report.n_models, 3);
        assert_eq!(report.n_samples, 2);
        assert!((report.majority_vote.accuracy - 1.0).abs() < 1e-12);
        assert!((report.weighted_search.accuracy() - 1.0).abs() < 1e-12);
        let baseline: Vec<f64> = report.baselines.iter().map(|b| b.accuracy).collect();
        assert_eq!(baseline, vec![1.0, 1.0, 0.0]);
        assert_eq!(report.best_baseline().unwrap().accuracy, 1.0);
    }

    #[test]
    fn test_suggested_weights_score_perfectly() {
        let (preds, labels) = scenario();
        let weights = WeightTuple::new(vec![0.34, 0.33, 0.33]).unwrap();
        let result = FusionEngine::default()
            .evaluate_weights(&preds, &labels, &weights)
            .unwrap();
        assert_eq!(result.predictions, vec![1, 0]);
        assert!((result.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FusionConfig::new().with_grid(GridConfig::new().with_step(-0.1));
        assert!(matches!(
            FusionEngine::new(config).unwrap_err(),
            FusionError::ConfigError(_)
        ));
    }

    #[test]
    fn test_oversized_timeout_rejected_at_construction() {
        let err = FusionEngine::new(FusionConfig::new().with_timeout(1e30)).unwrap_err();
        assert!(matches!(err, FusionError::ConfigError(_)));

        let (preds, labels) = scenario();
        let engine = FusionEngine::new(FusionConfig::new().with_timeout(1e6)).unwrap();
        assert!((engine.weighted_search(&preds, &labels).unwrap().accuracy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fuse_fails_fast_on_empty_space() {
        let (preds, labels) = scenario();
        let config = FusionConfig::new().with_grid(GridConfig::new().with_step(0.3));
        let engine = FusionEngine::new(config).unwrap();
        assert!(matches!(
            engine.fuse(&preds, &labels).unwrap_err(),
            FusionError::EmptySearchSpace { .. }
        ));
    }

    #[test]
    fn test_report_json() {
        let (preds, labels) = scenario();
        let report = FusionEngine::default()
            .fuse_named(&preds, &labels, vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["n_models"], 3);
        assert_eq!(value["majority_vote"]["strategy"], "majority_vote");
        assert_eq!(value["weighted_search"]["candidates_evaluated"], 66);
        assert_eq!(value["model_names"][2], "c");
    }

    #[test]
    fn test_cancellation_propagates() {
        let (preds, labels) = scenario();
        let token = CancellationToken::new();
        let engine = FusionEngine::default().with_cancellation(token.clone());
        token.cancel();
        assert!(matches!(
            engine.weighted_search(&preds, &labels).unwrap_err(),
            FusionError::Cancelled
        ));
        // Non-search rules are unaffected
        assert!(engine.majority_vote(&preds, &labels).is_ok());
    }
}
