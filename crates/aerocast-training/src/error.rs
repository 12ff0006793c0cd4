use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid training job spec: {0}")]
    InvalidSpec(String),

    #[error("dataset source unavailable: {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("dataset source has no data rows: {}", .0.display())]
    NoData(PathBuf),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("feature window has {features} rows but target window has {targets}")]
    RowMisalignment { features: usize, targets: usize },

    #[error("unknown target column: {0}")]
    UnknownTarget(String),

    #[error("not fitted: {0}")]
    NotFitted(String),

    #[error("no persisted model for target: {0}")]
    ModelNotFound(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("metric error: {0}")]
    Metric(String),

    #[error("training job cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrainingError {
    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable { path: path.into(), reason: reason.to_string() }
    }
}
