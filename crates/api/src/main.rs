//! Suraksha Flood Risk Pipeline - Main Entry Point

use anyhow::Context;
use api::{init_logging, install_metrics, run_server, AppConfig, Pipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "suraksha", version, about = "Flood risk prediction and alerting pipeline")]
struct Cli {
    /// Configuration file (defaults to ./suraksha.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the synthetic CSV datasets
    Generate {
        /// Overwrite existing datasets
        #[arg(long)]
        force: bool,
    },
    /// Prepare data, evaluate models, run the simulation and write the alert feed
    Run,
    /// Write the model evaluation report only
    Evaluate,
    /// Print one alert message
    Alert {
        #[arg(long)]
        city: String,
        #[arg(long)]
        probability: f64,
        /// `en` or `hi`
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Serve the dashboard API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.logging.level)?;

    info!("=== Suraksha Flood Risk Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Generate { force } => {
            let pipeline = Pipeline::new(config);
            if pipeline.generate_datasets(force)? {
                info!("✓ Datasets written to {}", pipeline.store().data_dir().display());
            }
        }
        Command::Run => {
            let metrics = install_metrics()?;
            let summary = Pipeline::new(config).run()?;
            info!(
                "✓ Run complete: {} samples, {} frames, {} alerts (evaluated: {})",
                summary.samples, summary.frames, summary.alerts, summary.evaluated
            );
            info!("Metrics:\n{}", metrics.render());
        }
        Command::Evaluate => {
            let pipeline = Pipeline::new(config);
            let rows = pipeline.prepare_training_data()?;
            let engine = pipeline.load_engine()?;
            let stats = pipeline.evaluate(&engine, &rows)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Alert { city, probability, lang } => {
            let alert = alerting::generate_alert(&city, probability, &lang)?;
            println!("{}", alert.message);
        }
        Command::Serve => {
            let metrics = install_metrics()?;
            run_server(&config, metrics).await?;
        }
    }

    Ok(())
}
