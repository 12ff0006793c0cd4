//! Model persistence.
//!
//! One JSON snapshot per target, overwritten on every save. Writes go to a
//! temporary file in the destination directory which is then renamed over the
//! snapshot, so a reader never sees a half-written model.

use crate::error::{TrainingError, TrainingResult};
use crate::layout::ModelLayout;
use crate::regressor::{OnlineRegressor, Regressor};
use crate::scaler::ScalerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Everything needed to use a trained target model later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub target: String,
    pub domain: String,
    /// Feature columns the model was trained on, in order.
    pub feature_columns: Vec<String>,
    /// Training statistics, present only for runs with accumulated scaling.
    #[serde(default)]
    pub scaler: Option<ScalerState>,
    pub regressor: Regressor,
    pub saved_at: DateTime<Utc>,
}

impl ModelSnapshot {
    #[must_use]
    pub fn rows_seen(&self) -> u64 {
        self.regressor.samples_seen()
    }
}

pub trait ModelStore: Send + Sync {
    /// Persist `snapshot` under `target`, replacing any previous one.
    fn save(&self, target: &str, snapshot: &ModelSnapshot) -> TrainingResult<PathBuf>;

    /// Load the snapshot for `target`, or `ModelNotFound`.
    fn load(&self, target: &str) -> TrainingResult<ModelSnapshot>;
}

#[derive(Debug, Clone)]
pub struct FsModelStore {
    layout: ModelLayout,
}

impl FsModelStore {
    #[must_use]
    pub fn new(layout: ModelLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }
}

impl ModelStore for FsModelStore {
    fn save(&self, target: &str, snapshot: &ModelSnapshot) -> TrainingResult<PathBuf> {
        self.layout.ensure_dirs()?;
        let path = self.layout.model_path(target);
        let json = serde_json::to_vec_pretty(snapshot)?;

        let mut tmp = tempfile::NamedTempFile::new_in(self.layout.root())?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| TrainingError::Io(e.error))?;

        tracing::debug!(target_name = target, path = %path.display(), "model snapshot saved");
        Ok(path)
    }

    fn load(&self, target: &str) -> TrainingResult<ModelSnapshot> {
        let path = self.layout.model_path(target);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TrainingError::ModelNotFound(target.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
