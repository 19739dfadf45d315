//! Ensemble Fusion CLI Module
//!
//! Command-line interface for fusing prediction tables, scoring fixed
//! weights, inspecting the weight search space and running a synthetic demo.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::ensemble::{
    FusionConfig, FusionEngine, FusionReport, FusionResult, GridConfig, RoundingMode,
    SimplexGrid, VoteTieBreak, WeightTuple,
};
use crate::scoring::{collect_predictions, scorer_names, ScoringFunction};
use crate::synthetic::{SyntheticConfig, SyntheticEnsemble};
use crate::utils::{save_prediction_table, PredictionLoader, PredictionTable};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn pct(accuracy: f64) -> String {
    format!("{:.2}%", accuracy * 100.0)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ensemble-fusion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Majority vote and simplex weight search for binary classifier ensembles")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where predictions come from
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Prediction table (CSV or TSV): one probability column per model plus a label column
    #[arg(short, long)]
    pub predictions: PathBuf,

    /// Label column name
    #[arg(short, long, default_value = "label")]
    pub label: String,

    /// Model columns to use, in order (default: every non-label column)
    #[arg(short, long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,
}

/// Settings that override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct FusionArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Weight axis step
    #[arg(long)]
    pub step: Option<f64>,

    /// Rounding at 0.5 (half-to-even, half-up)
    #[arg(long)]
    pub rounding: Option<String>,

    /// Majority vote tie-break (lowest, highest)
    #[arg(long)]
    pub tie_break: Option<String>,

    /// Evaluate weight candidates on a thread pool
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads (implies --parallel)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Abort the weight search after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fuse a prediction table: baselines, majority vote, soft vote, best weights
    Fuse {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        fusion: FusionArgs,

        /// Write the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score one fixed weight tuple
    Evaluate {
        #[command(flatten)]
        table: TableArgs,

        /// Comma-separated weights, one per model, summing to 1
        #[arg(short, long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,

        /// Rounding at 0.5 (half-to-even, half-up)
        #[arg(long)]
        rounding: Option<String>,
    },

    /// Describe the weight search space
    Grid {
        /// Number of models
        #[arg(short = 'n', long, default_value = "3")]
        models: usize,

        /// Weight axis step
        #[arg(long, default_value = "0.1")]
        step: f64,

        /// Print every candidate in canonical order
        #[arg(long)]
        list: bool,
    },

    /// Fuse a seeded synthetic ensemble
    Demo {
        /// Number of samples
        #[arg(long, default_value = "500")]
        samples: usize,

        /// Number of models
        #[arg(short = 'n', long, default_value = "3")]
        models: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Scoring batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// Save the generated prediction table as CSV
        #[arg(long)]
        export: Option<PathBuf>,

        #[command(flatten)]
        fusion: FusionArgs,

        /// Write the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Configuration file (or defaults) with command-line overrides applied
pub fn build_config(args: &FusionArgs) -> anyhow::Result<FusionConfig> {
    let mut config = match &args.config {
        Some(path) => FusionConfig::from_json_file(path)?,
        None => FusionConfig::default(),
    };

    if let Some(step) = args.step {
        config.grid.step = step;
    }
    if let Some(rounding) = &args.rounding {
        config.rounding = rounding.parse::<RoundingMode>().map_err(anyhow::Error::msg)?;
    }
    if let Some(tie_break) = &args.tie_break {
        config.tie_break = tie_break.parse::<VoteTieBreak>().map_err(anyhow::Error::msg)?;
    }
    if args.parallel {
        config.parallel.enabled = true;
    }
    if let Some(n) = args.threads {
        config.parallel = config.parallel.with_threads(n);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = Some(secs);
    }

    config.validate()?;
    Ok(config)
}

fn load_table(args: &TableArgs) -> anyhow::Result<PredictionTable> {
    let mut loader = PredictionLoader::new(&args.label);
    if let Some(models) = &args.models {
        loader = loader.with_model_columns(models.clone());
    }
    Ok(loader.load_csv(&args.predictions)?)
}

// ─── Reporting ─────────────────────────────────────────────────────────────────

fn print_result_line(name: &str, result: &FusionResult) {
    let weights = result
        .weights
        .as_ref()
        .map(|w| format!("  {}", dim(&w.to_string())))
        .unwrap_or_default();
    println!("  {:<22} {}{}", muted(name), pct(result.accuracy).as_str().white(), weights);
}

pub fn print_report(report: &FusionReport) {
    section("Models");
    for (k, baseline) in report.baselines.iter().enumerate() {
        let name = report
            .model_names
            .get(k)
            .cloned()
            .unwrap_or_else(|| format!("model {}", k));
        print_result_line(&name, baseline);
    }

    section("Fusion");
    print_result_line("majority vote", &report.majority_vote);
    print_result_line("soft vote", &report.soft_vote);
    print_result_line("best weights", &report.weighted_search.best);

    let search = &report.weighted_search;
    let raw = search
        .raw_space_size
        .map(|n| n.to_string())
        .unwrap_or_else(|| "overflow".to_string());
    println!();
    println!("  {}", kv("samples", &report.n_samples.to_string()));
    println!(
        "  {}",
        kv(
            "candidates",
            &format!("{} of {} tuples", search.candidates_evaluated, raw)
        )
    );
    println!("  {}", kv("search time", &format!("{:.3}s", search.elapsed_secs)));
}

fn write_report(report: &FusionReport, output: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = output {
        report.write_json(path)?;
        step_ok(&format!("Report written to {}", path.display()));
    }
    Ok(())
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_fuse(table: &TableArgs, fusion: &FusionArgs, output: Option<&Path>) -> anyhow::Result<()> {
    section("Fuse");
    let config = build_config(fusion)?;

    step_run("Loading predictions");
    let start = Instant::now();
    let table = load_table(table)?;
    step_done(&format!(
        "{} models × {} samples ({:.2}s)",
        table.predictions.n_models(),
        table.predictions.n_samples(),
        start.elapsed().as_secs_f64()
    ));

    let engine = FusionEngine::new(config)?;
    let report = engine.fuse_named(&table.predictions, &table.labels, table.model_names)?;
    print_report(&report);
    write_report(&report, output)
}

pub fn cmd_evaluate(table: &TableArgs, weights: &[f64], rounding: Option<&str>) -> anyhow::Result<()> {
    section("Evaluate");
    let mut config = FusionConfig::default();
    if let Some(r) = rounding {
        config.rounding = r.parse::<RoundingMode>().map_err(anyhow::Error::msg)?;
    }

    let table = load_table(table)?;
    let weights = WeightTuple::with_tolerance(weights.to_vec(), &config.grid)?;
    let engine = FusionEngine::new(config)?;
    let result = engine.evaluate_weights(&table.predictions, &table.labels, &weights)?;

    print_result_line("weighted vote", &result);
    Ok(())
}

pub fn cmd_grid(models: usize, step: f64, list: bool) -> anyhow::Result<()> {
    section("Search space");
    let simplex = SimplexGrid::new(&GridConfig::new().with_step(step), models)?;
    let raw = simplex
        .raw_size()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "overflow".to_string());

    println!("  {}", kv("models", &models.to_string()));
    println!("  {}", kv("axis points", &simplex.axis().len().to_string()));
    println!("  {}", kv("cartesian product", &raw));
    println!("  {}", kv("valid tuples", &simplex.candidate_count().to_string()));

    if list {
        println!();
        for (i, w) in simplex.candidates().enumerate() {
            println!("  {:>6}  {}", dim(&i.to_string()), w);
        }
    }
    Ok(())
}

pub fn cmd_demo(
    samples: usize,
    models: usize,
    seed: u64,
    batch_size: usize,
    export: Option<&Path>,
    fusion: &FusionArgs,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Demo");
    let config = build_config(fusion)?;

    step_run("Generating synthetic ensemble");
    let synthetic = SyntheticConfig::default()
        .with_samples(samples)
        .with_models(models)
        .with_seed(seed);
    let set = SyntheticEnsemble::generate(&synthetic)?;
    step_done(&format!("{} samples, seed {}", samples, seed));

    step_run("Scoring");
    let scorers: Vec<&dyn ScoringFunction> =
        set.scorers.iter().map(|s| s as &dyn ScoringFunction).collect();
    let predictions = collect_predictions(&scorers, &set.inputs, batch_size)?;
    step_done(&format!("batch size {}", batch_size));

    let table = PredictionTable {
        model_names: scorer_names(&scorers),
        predictions,
        labels: set.labels,
    };
    if let Some(path) = export {
        save_prediction_table(path, &table, "label")?;
        step_ok(&format!("Predictions written to {}", path.display()));
    }

    let engine = FusionEngine::new(config)?;
    let report = engine.fuse_named(&table.predictions, &table.labels, table.model_names.clone())?;
    print_report(&report);
    write_report(&report, output)
}
