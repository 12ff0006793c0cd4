//! Aerocast CLI - streaming training for air-quality forecast models
//!
//! This CLI provides an `aerocast` command that trains one online regressor
//! per forecast target from chunked CSV sources and scores the models on a
//! held-out split.

mod commands;
mod logging;

use aerocast_core::PipelineConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{domains, run};

/// Aerocast - streaming training for air-quality forecasts
#[derive(Parser, Debug)]
#[command(
    name = "aerocast",
    author,
    version,
    about = "Aerocast - streaming training for air-quality forecasts",
    long_about = "Aerocast trains incremental regressors on arbitrarily large CSV datasets in fixed-size chunks,\npersists one model per target and evaluates them on a held-out split."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to ./aerocast.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train and evaluate the models of one domain
    ///
    /// Reads the domain's training split chunk by chunk, updates one model per
    /// target, persists the models and scores them on the test split.
    Run(run::RunArgs),

    /// List configured domains and their targets
    Domains {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = PipelineConfig::discover_and_load(args.config.as_deref()).context("Failed to load configuration")?;
    let machine_output = match &args.command {
        Command::Run(run_args) => run_args.json,
        Command::Domains { json } => *json,
    };
    logging::init(&args.log_level, &config.log_file, machine_output)?;
    tracing::debug!(config = ?args.config, "configuration loaded");

    match args.command {
        Command::Run(run_args) => run::execute(run_args, &config).await?,
        Command::Domains { json } => domains::execute(&config, json)?,
    }

    Ok(())
}
