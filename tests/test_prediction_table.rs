//! Integration test: prediction tables on disk
//! Tests: CSV export → reload → fusion report → JSON report

use ensemble_fusion::ensemble::{FusionConfig, FusionEngine};
use ensemble_fusion::scoring::{collect_predictions, ScoringFunction};
use ensemble_fusion::synthetic::{SyntheticConfig, SyntheticEnsemble};
use ensemble_fusion::utils::{save_prediction_table, PredictionLoader, PredictionTable};
use ensemble_fusion::FusionError;
use std::fs;
use tempfile::tempdir;

fn demo_table() -> PredictionTable {
    let set = SyntheticEnsemble::generate(&SyntheticConfig::default().with_samples(120)).unwrap();
    let scorers: Vec<&dyn ScoringFunction> =
        set.scorers.iter().map(|s| s as &dyn ScoringFunction).collect();
    PredictionTable {
        model_names: scorers.iter().map(|s| s.name().to_string()).collect(),
        predictions: collect_predictions(&scorers, &set.inputs, 32).unwrap(),
        labels: set.labels,
    }
}

#[test]
fn test_exported_table_fuses_like_in_memory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preds.csv");
    let table = demo_table();
    save_prediction_table(&path, &table, "label").unwrap();

    let loaded = PredictionLoader::new("label").load_csv(&path).unwrap();
    assert_eq!(loaded.model_names, table.model_names);
    assert_eq!(loaded.labels, table.labels);

    let engine = FusionEngine::default();
    let direct = engine.fuse(&table.predictions, &table.labels).unwrap();
    let reloaded = engine.fuse(&loaded.predictions, &loaded.labels).unwrap();
    assert_eq!(direct.majority_vote.predictions, reloaded.majority_vote.predictions);
    assert_eq!(direct.weighted_search.best_index, reloaded.weighted_search.best_index);
}

#[test]
fn test_report_written_as_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");
    let table = demo_table();

    let report = FusionEngine::default()
        .fuse_named(&table.predictions, &table.labels, table.model_names.clone())
        .unwrap();
    report.write_json(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["n_models"], 3);
    assert_eq!(value["model_names"][0], "model_0");
    assert_eq!(value["weighted_search"]["best"]["strategy"], "weighted_search");
    assert_eq!(value["weighted_search"]["candidates_evaluated"], 66);
}

#[test]
fn test_selected_model_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preds.csv");
    fs::write(&path, "label,a,b,c\n1,0.9,0.8,0.3\n0,0.1,0.2,0.7\n").unwrap();

    let table = PredictionLoader::new("label")
        .with_model_columns(vec!["c".to_string(), "a".to_string()])
        .load_csv(&path)
        .unwrap();
    assert_eq!(table.model_names, vec!["c", "a"]);
    assert_eq!(table.predictions.n_models(), 2);
    assert!((table.predictions.model(0)[0] - 0.3).abs() < 1e-12);
}

#[test]
fn test_non_binary_label_column_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preds.csv");
    fs::write(&path, "label,a\n2,0.9\n0,0.1\n").unwrap();

    let err = PredictionLoader::new("label").load_csv(&path).unwrap_err();
    assert!(matches!(err, FusionError::InvalidInput(_)));
}

#[test]
fn test_config_file_drives_engine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fusion.json");
    fs::write(&path, r#"{"grid": {"step": 0.5}, "tie_break": "highest"}"#).unwrap();

    let config = FusionConfig::from_json_file(&path).unwrap();
    let engine = FusionEngine::new(config).unwrap();
    assert_eq!(engine.search_space(3).unwrap().candidate_count(), 6);
}
