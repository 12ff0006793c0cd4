use crate::job::TrainingJobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { job_id: TrainingJobId, domain: String, targets: Vec<String> },
    Chunk { job_id: TrainingJobId, index: u64, rows: usize, offset: usize },
    Persisted { job_id: TrainingJobId, target: String, path: PathBuf },
    Finished { job_id: TrainingJobId, rows: u64 },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Forwards progress to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { job_id, domain, targets } => {
                tracing::info!(%job_id, "training {} targets of {domain}: {}", targets.len(), targets.join(", "));
            }
            ProgressEvent::Chunk { job_id, index, rows, offset } => {
                tracing::info!(%job_id, chunk = index, "{offset} processed ({rows} rows this chunk)");
            }
            ProgressEvent::Persisted { job_id, target, path } => {
                tracing::info!(%job_id, "{target} model saved to {}", path.display());
            }
            ProgressEvent::Finished { job_id, rows } => tracing::info!(%job_id, "training finished after {rows} rows"),
        }
    }
}
