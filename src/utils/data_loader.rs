//! Loading and saving prediction tables
//!
//! A prediction table is a CSV with one probability column per model and one
//! binary label column. Missing cells are rejected rather than filled.

use crate::ensemble::{LabelVector, PredictionMatrix};
use crate::error::{FusionError, Result};
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Predictions, labels and the model column names they came from
#[derive(Debug, Clone)]
pub struct PredictionTable {
    pub model_names: Vec<String>,
    pub predictions: PredictionMatrix,
    pub labels: LabelVector,
}

/// Loader for prediction tables
#[derive(Debug, Clone)]
pub struct PredictionLoader {
    /// Label column name
    label_column: String,
    /// Model columns in order (None = every other column, in file order)
    model_columns: Option<Vec<String>>,
    /// Field separator
    separator: u8,
}

impl Default for PredictionLoader {
    fn default() -> Self {
        Self::new("label")
    }
}

impl PredictionLoader {
    pub fn new(label_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
            model_columns: None,
            separator: b',',
        }
    }

    /// Restrict and order the model columns
    pub fn with_model_columns(mut self, columns: Vec<String>) -> Self {
        self.model_columns = Some(columns);
        self
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Read a CSV file; `.tsv` files switch the separator to a tab
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<PredictionTable> {
        let path = path.as_ref();
        let separator = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => self.separator,
        };
        let file = File::open(path)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .with_parse_options(CsvParseOptions::default().with_separator(separator))
            .into_reader_with_file_handle(file)
            .finish()?;

        let table = self.from_dataframe(&df)?;
        info!(
            path = %path.display(),
            n_models = table.predictions.n_models(),
            n_samples = table.predictions.n_samples(),
            "Loaded prediction table"
        );
        Ok(table)
    }

    /// Extract predictions and labels from an in-memory frame
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<PredictionTable> {
        let model_names: Vec<String> = match &self.model_columns {
            Some(cols) => cols.clone(),
            None => df
                .get_column_names()
                .into_iter()
                .filter(|name| name.as_str() != self.label_column)
                .map(|s| s.to_string())
                .collect(),
        };
        if model_names.is_empty() {
            return Err(FusionError::InvalidInput(
                "Prediction table has no model columns".to_string(),
            ));
        }

        let labels = LabelVector::new(Self::column_values(df, &self.label_column)?)?;
        let columns = model_names
            .iter()
            .map(|name| Self::column_values(df, name))
            .collect::<Result<Vec<Array1<f64>>>>()?;
        let predictions = PredictionMatrix::new(columns)?;

        Ok(PredictionTable {
            model_names,
            predictions,
            labels,
        })
    }

    fn column_values(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
        let series = df
            .column(name)
            .map_err(|_| FusionError::InvalidInput(format!("column '{}' not found", name)))?;
        let series_f64 = series.cast(&DataType::Float64)?;
        series_f64
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    FusionError::InvalidInput(format!(
                        "column '{}' row {}: missing or non-numeric value",
                        name, row
                    ))
                })
            })
            .collect()
    }
}

/// Write predictions and labels as a CSV prediction table
pub fn save_prediction_table(path: impl AsRef<Path>, table: &PredictionTable, label_column: &str) -> Result<()> {
    let mut series: Vec<Series> = table
        .model_names
        .iter()
        .zip(table.predictions.models())
        .map(|(name, values)| Series::new(name.as_str().into(), values.to_vec()))
        .collect();
    let labels: Vec<u32> = table.labels.as_array().iter().map(|&l| l as u32).collect();
    series.push(Series::new(label_column.into(), labels));

    let mut df = DataFrame::new(series)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_all_model_columns() {
        let file = write_csv("m1,m2,m3,label\n0.9,0.8,0.3,1\n0.1,0.2,0.7,0\n");
        let table = PredictionLoader::default().load_csv(file.path()).unwrap();

        assert_eq!(table.model_names, vec!["m1", "m2", "m3"]);
        assert_eq!(table.predictions.n_models(), 3);
        assert_eq!(table.labels.as_array().to_vec(), vec![1, 0]);
    }

    #[test]
    fn test_select_model_columns() {
        let file = write_csv("y,a,b\n1,0.6,0.4\n0,0.3,0.2\n");
        let table = PredictionLoader::new("y")
            .with_model_columns(vec!["b".to_string()])
            .load_csv(file.path())
            .unwrap();

        assert_eq!(table.model_names, vec!["b"]);
        assert!((table.predictions.model(0)[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_missing_value_rejected() {
        let file = write_csv("m1,label\n0.9,1\n,0\n");
        let err = PredictionLoader::default().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, FusionError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_label_column() {
        let file = write_csv("m1,m2\n0.9,0.1\n");
        let err = PredictionLoader::default().load_csv(file.path()).unwrap_err();
        assert!(matches!(err, FusionError::InvalidInput(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preds.csv");
        let table = PredictionTable {
            model_names: vec!["cnn_a".into(), "cnn_b".into()],
            predictions: PredictionMatrix::from_vecs(vec![vec![0.25, 0.75], vec![0.5, 1.0]]).unwrap(),
            labels: LabelVector::from_vec(vec![0.0, 1.0]).unwrap(),
        };
        save_prediction_table(&path, &table, "label").unwrap();

        let loaded = PredictionLoader::default().load_csv(&path).unwrap();
        assert_eq!(loaded.model_names, table.model_names);
        assert_eq!(loaded.labels, table.labels);
        assert!((loaded.predictions.model(1)[0] - 0.5).abs() < 1e-12);
    }
}
