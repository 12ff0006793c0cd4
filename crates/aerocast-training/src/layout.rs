use crate::error::TrainingResult;
use std::path::{Path, PathBuf};

/// Filesystem layout for persisted models and manifests.
///
/// Everything lives flat under one model directory:
/// `<root>/<target>_model.json` and `<root>/<domain>_training_manifest.json`.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    root: PathBuf,
}

impl ModelLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn model_path(&self, target: &str) -> PathBuf {
        self.root.join(format!("{target}_model.json"))
    }

    #[must_use]
    pub fn manifest_path(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{domain}_training_manifest.json"))
    }

    pub fn ensure_dirs(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
