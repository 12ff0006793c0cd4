use crate::error::{TrainingError, TrainingResult};
use crate::job::TrainingJobId;
use crate::scaler::ScalerMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A persisted model file and its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub target: String,
    pub path: PathBuf,
    pub sha256: String,
}

/// Record of one completed streaming training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingManifest {
    pub job_id: TrainingJobId,
    pub created_at: DateTime<Utc>,
    pub domain: String,
    pub chunk_size: usize,
    /// Non-empty chunks applied to the models.
    pub chunks: u64,
    pub rows: u64,
    pub scaler_mode: ScalerMode,
    pub feature_columns: Vec<String>,
    pub artifacts: Vec<TrainingArtifact>,
}

impl TrainingManifest {
    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read(path: &Path) -> TrainingResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn make_artifact(target: &str, path: PathBuf) -> TrainingResult<TrainingArtifact> {
    if !path.exists() {
        return Err(TrainingError::Artifact(format!(
            "artifact path does not exist: {}",
            path.display()
        )));
    }

    let hash = sha256_file(&path)?;
    Ok(TrainingArtifact { target: target.to_string(), path, sha256: hash })
}
