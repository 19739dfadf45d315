//! Ensemble Fusion - Main Entry Point

use clap::Parser;
use ensemble_fusion::cli::{cmd_demo, cmd_evaluate, cmd_fuse, cmd_grid, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ensemble_fusion=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fuse { table, fusion, output } => {
            cmd_fuse(&table, &fusion, output.as_deref())?;
        }
        Commands::Evaluate { table, weights, rounding } => {
            cmd_evaluate(&table, &weights, rounding.as_deref())?;
        }
        Commands::Grid { models, step, list } => {
            cmd_grid(models, step, list)?;
        }
        Commands::Demo { samples, models, seed, batch_size, export, fusion, output } => {
            cmd_demo(
                samples,
                models,
                seed,
                batch_size,
                export.as_deref(),
                &fusion,
                output.as_deref(),
            )?;
        }
    }

    Ok(())
}
