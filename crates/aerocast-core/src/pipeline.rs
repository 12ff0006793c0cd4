//! One train-then-evaluate pass over a domain.

use crate::config::PipelineConfig;
use crate::error::CoreResult;
use crate::evaluation::{EvaluationReport, Evaluator};
use crate::training::StreamingTrainer;
use aerocast_training::{ProgressSink, ScalerMode, Trainer, TrainingJob, TrainingManifest};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Per-invocation overrides on top of the configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub domain: String,
    /// Subset of the domain's targets; empty means all of them.
    pub targets: Vec<String>,
    pub chunk_size: Option<usize>,
    pub chunk_pause_ms: Option<u64>,
    pub scaler_mode: Option<ScalerMode>,
}

impl PipelineRequest {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub manifest: TrainingManifest,
    pub report: EvaluationReport,
}

/// Build the training job described by `config` and `request`.
pub fn build_job(config: &PipelineConfig, request: &PipelineRequest) -> CoreResult<TrainingJob> {
    let domain = config.domain_spec(&request.domain)?;
    let mut job = TrainingJob::new(domain, request.chunk_size.unwrap_or(config.chunk_size))
        .with_targets(&request.targets)?;
    job.chunk_pause_ms = request.chunk_pause_ms.unwrap_or(config.chunk_pause_ms);
    job.scaler_mode = request.scaler_mode.unwrap_or(config.scaler_mode);
    job.regressor = config.regressor.clone();
    job.validate()?;
    Ok(job)
}

/// Train every requested target on the domain's training split, persist the
/// models, then score them on the test split.
///
/// Training errors abort the run before anything is persisted. Evaluation
/// failures of individual targets are carried in the report.
pub async fn run_pipeline(
    config: &PipelineConfig,
    request: &PipelineRequest,
    progress: &dyn ProgressSink,
) -> CoreResult<PipelineOutcome> {
    run_pipeline_until(config, request, progress, CancellationToken::new()).await
}

/// Like `run_pipeline`, stopping training at the next chunk boundary once
/// `shutdown` is cancelled.
pub async fn run_pipeline_until(
    config: &PipelineConfig,
    request: &PipelineRequest,
    progress: &dyn ProgressSink,
    shutdown: CancellationToken,
) -> CoreResult<PipelineOutcome> {
    let job = build_job(config, request)?;
    tracing::info!(
        job_id = %job.job_id,
        domain = %job.domain.name,
        chunk_size = job.chunk_size,
        scaler_mode = %job.scaler_mode,
        "starting pipeline"
    );

    let trainer = StreamingTrainer::new(config.model_layout());
    trainer.prepare(&job).await?;

    let watcher = {
        let trainer = trainer.clone();
        let job_id = job.job_id.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            if let Err(e) = trainer.cancel(&job_id).await {
                tracing::warn!(%job_id, "failed to cancel training: {e}");
            }
        })
    };
    let result = trainer.run(&job, progress).await;
    watcher.abort();
    let manifest = result?;

    let report = {
        let _span = tracing::info_span!("evaluate", domain = %job.domain.name).entered();
        let report = Evaluator::new(trainer.store()).evaluate(&job.domain, &job.targets)?;
        tracing::info!(failures = report.failures(), "evaluation finished");
        report
    };

    Ok(PipelineOutcome { manifest, report })
}
