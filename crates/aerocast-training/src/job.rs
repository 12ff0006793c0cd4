use crate::dataset::{CsvSource, DatasetRole};
use crate::error::{TrainingError, TrainingResult};
use crate::impute::FillPolicy;
use crate::regressor::RegressorSpec;
use crate::scaler::ScalerMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a training job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingJobId(pub String);

impl TrainingJobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TrainingJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrainingJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Feature and target sources of one dataset role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPair {
    pub features: CsvSource,
    pub targets: CsvSource,
}

/// A named prediction task: its data, targets and target fill policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    pub train: DatasetPair,
    pub test: DatasetPair,
    pub targets: Vec<String>,
    pub target_fill: FillPolicy,
}

impl DomainSpec {
    #[must_use]
    pub fn pair(&self, role: DatasetRole) -> &DatasetPair {
        match role {
            DatasetRole::Train => &self.train,
            DatasetRole::Test => &self.test,
        }
    }

    /// `requested` when non-empty, otherwise every target of the domain.
    /// Repeats are dropped, keeping the first occurrence.
    pub fn resolve_targets(&self, requested: &[String]) -> TrainingResult<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.targets.clone());
        }
        let mut resolved: Vec<String> = Vec::with_capacity(requested.len());
        for target in requested {
            if !self.targets.contains(target) {
                return Err(TrainingError::UnknownTarget(format!("{target} (domain {})", self.name)));
            }
            if !resolved.contains(target) {
                resolved.push(target.clone());
            }
        }
        Ok(resolved)
    }
}

/// Everything one streaming training run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJob {
    pub job_id: TrainingJobId,
    pub created_at: DateTime<Utc>,
    pub domain: DomainSpec,
    pub targets: Vec<String>,
    pub chunk_size: usize,
    /// Pause between chunks, in milliseconds.
    pub chunk_pause_ms: u64,
    pub scaler_mode: ScalerMode,
    pub regressor: RegressorSpec,
}

impl TrainingJob {
    /// A job over every target of `domain`.
    #[must_use]
    pub fn new(domain: DomainSpec, chunk_size: usize) -> Self {
        Self {
            job_id: TrainingJobId::new(),
            created_at: Utc::now(),
            targets: domain.targets.clone(),
            domain,
            chunk_size,
            chunk_pause_ms: 0,
            scaler_mode: ScalerMode::default(),
            regressor: RegressorSpec::default(),
        }
    }

    /// Restrict the job to `requested` (empty keeps every domain target).
    pub fn with_targets(mut self, requested: &[String]) -> TrainingResult<Self> {
        self.targets = self.domain.resolve_targets(requested)?;
        Ok(self)
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.domain.name.trim().is_empty() {
            return Err(TrainingError::InvalidSpec("domain name is required".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(TrainingError::InvalidSpec("chunk_size must be >= 1".to_string()));
        }
        if self.targets.is_empty() {
            return Err(TrainingError::InvalidSpec("at least one target is required".to_string()));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].contains(target) {
                return Err(TrainingError::InvalidSpec(format!("target {target} is listed more than once")));
            }
        }
        self.regressor.validate()?;
        Ok(())
    }
}
