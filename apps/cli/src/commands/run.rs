//! Run command implementation.

use aerocast_core::{PipelineConfig, PipelineOutcome, PipelineRequest, TargetOutcome, run_pipeline_until};
use aerocast_training::{ScalerMode, TracingProgressSink};
use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Domain to train (see `aerocast domains`)
    #[arg(short, long)]
    pub domain: String,

    /// Target to train; repeat for several (default: every target of the domain)
    #[arg(short, long = "target")]
    pub targets: Vec<String>,

    /// Rows per training chunk (overrides the configuration)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Pause between chunks in milliseconds (overrides the configuration)
    #[arg(long)]
    pub chunk_pause_ms: Option<u64>,

    /// Feature scaling strategy (overrides the configuration)
    #[arg(long, value_enum)]
    pub scaler: Option<ScalerArg>,

    /// Output the manifest and evaluation report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScalerArg {
    /// Refit on every chunk
    PerChunk,
    /// Accumulate statistics across chunks and persist them with the models
    Running,
}

impl From<ScalerArg> for ScalerMode {
    fn from(arg: ScalerArg) -> Self {
        match arg {
            ScalerArg::PerChunk => Self::PerChunk,
            ScalerArg::Running => Self::Running,
        }
    }
}

pub async fn execute(args: RunArgs, config: &PipelineConfig) -> Result<()> {
    let request = PipelineRequest {
        domain: args.domain.clone(),
        targets: args.targets,
        chunk_size: args.chunk_size,
        chunk_pause_ms: args.chunk_pause_ms,
        scaler_mode: args.scaler.map(ScalerMode::from),
    };

    let shutdown = CancellationToken::new();
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping at the next chunk boundary");
            on_interrupt.cancel();
        }
    });

    let outcome = run_pipeline_until(config, &request, &TracingProgressSink, shutdown)
        .await
        .with_context(|| format!("Pipeline failed for domain {}", args.domain))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome) {
    let manifest = &outcome.manifest;
    println!();
    println!("{}", "Training complete".bold().green());
    println!("  Job: {}", manifest.job_id.to_string().cyan());
    println!("  Domain: {}", manifest.domain);
    println!("  Rows: {} in {} chunks of up to {}", manifest.rows, manifest.chunks, manifest.chunk_size);
    println!("  Scaler: {}", manifest.scaler_mode);
    for artifact in &manifest.artifacts {
        println!("  {}: {}", artifact.target, artifact.path.display().to_string().dimmed());
    }

    let report = &outcome.report;
    println!();
    println!("{}", format!("Evaluation ({} held-out rows)", report.rows).bold().cyan());
    for target in &report.targets {
        match &target.outcome {
            TargetOutcome::Scored { metrics } => {
                println!("  {:<24} {}", target.target, metrics.to_string().green());
            }
            TargetOutcome::Failed { kind, message } => {
                println!("  {:<24} {}", target.target, format!("✗ {kind}: {message}").red());
            }
        }
    }
    println!();
}
