//! Aerocast Core - streaming training pipeline for air-quality forecasts.
//!
//! This crate wires the primitives of `aerocast-training` into a runnable
//! pipeline:
//! - Configuration loading and domain resolution
//! - The chunked `StreamingTrainer`
//! - Per-target held-out evaluation
//!
//! # Example
//!
//! ```rust,no_run
//! use aerocast_core::{PipelineConfig, PipelineRequest, run_pipeline};
//! use aerocast_training::TracingProgressSink;
//!
//! #[tokio::main]
//! async fn main() -> aerocast_core::CoreResult<()> {
//!     let config = PipelineConfig::discover_and_load(None)?;
//!     let outcome = run_pipeline(&config, &PipelineRequest::new("aqi"), &TracingProgressSink).await?;
//!     println!("{} rows trained", outcome.manifest.rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod training;

pub use config::{ConfigError, ConfigResult, DomainConfig, LOCAL_CONFIG_FILE, PipelineConfig};
pub use error::{CoreError, CoreResult};
pub use evaluation::{EvaluationReport, Evaluator, FailureKind, TargetOutcome, TargetReport};
pub use pipeline::{PipelineOutcome, PipelineRequest, build_job, run_pipeline, run_pipeline_until};
pub use training::StreamingTrainer;
