//! Pipeline configuration.
//!
//! Built once per invocation and passed by reference to every component.
//! Paths inside a configuration file are resolved relative to that file's
//! directory.

use aerocast_training::{
    CsvSource, DatasetPair, DomainSpec, FillPolicy, ModelLayout, RegressorSpec, ScalerMode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "aerocast.toml";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory for domain CSV paths.
    pub data_dir: PathBuf,

    /// Directory holding model snapshots and training manifests.
    pub model_dir: PathBuf,

    /// Append-only operational log.
    pub log_file: PathBuf,

    /// Rows per training window.
    pub chunk_size: usize,

    /// Pause between training windows, in milliseconds.
    pub chunk_pause_ms: u64,

    pub scaler_mode: ScalerMode,

    pub regressor: RegressorSpec,

    /// Domains by name. Built-in domains are kept unless redefined.
    pub domains: BTreeMap<String, DomainConfig>,
}

/// Sources and targets of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub train_features: PathBuf,
    pub train_targets: PathBuf,
    pub test_features: PathBuf,
    pub test_targets: PathBuf,
    pub targets: Vec<String>,
    /// Fill policy for missing target values; `zero` for `pollen`, `median`
    /// for everything else when unset.
    #[serde(default)]
    pub target_fill: Option<FillPolicy>,
}

impl DomainConfig {
    /// The conventional `csv_data/{train,test}_{x,y}_<name>.csv` layout.
    #[must_use]
    pub fn conventional(name: &str, targets: &[&str]) -> Self {
        let csv = |role: &str, axis: &str| PathBuf::from("csv_data").join(format!("{role}_{axis}_{name}.csv"));
        Self {
            train_features: csv("train", "x"),
            train_targets: csv("train", "y"),
            test_features: csv("test", "x"),
            test_targets: csv("test", "y"),
            targets: targets.iter().map(|t| (*t).to_string()).collect(),
            target_fill: None,
        }
    }
}

/// Default fill policy for target columns of a domain: an unmeasured pollen
/// count means no pollen, an unmeasured index is simply missing.
#[must_use]
pub fn default_target_fill(domain: &str) -> FillPolicy {
    if domain == "pollen" { FillPolicy::Zero } else { FillPolicy::Median }
}

fn builtin_domains() -> BTreeMap<String, DomainConfig> {
    let mut domains = BTreeMap::new();
    domains.insert("aqi".to_string(), DomainConfig::conventional("aqi", &["european_aqi"]));
    domains.insert(
        "pollen".to_string(),
        DomainConfig::conventional(
            "pollen",
            &["alder_pollen", "birch_pollen", "grass_pollen", "mugwort_pollen", "olive_pollen", "ragweed_pollen"],
        ),
    );
    domains
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            model_dir: PathBuf::from("models"),
            log_file: PathBuf::from("log.txt"),
            chunk_size: 100_000,
            chunk_pause_ms: 0,
            scaler_mode: ScalerMode::default(),
            regressor: RegressorSpec::default(),
            domains: builtin_domains(),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Requested domain is not configured.
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        for (name, domain) in builtin_domains() {
            config.domains.entry(name).or_insert(domain);
        }
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration for one invocation.
    ///
    /// An explicit path must exist. Without one, `./aerocast.toml` is used when
    /// present, otherwise the built-in defaults.
    pub fn discover_and_load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }
        Ok(Self::default())
    }

    fn rebase(&mut self, base: &Path) {
        for dir in [&mut self.data_dir, &mut self.model_dir, &mut self.log_file] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("chunk_size must be >= 1".to_string()));
        }
        self.regressor.validate().map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        for (name, domain) in &self.domains {
            if domain.targets.is_empty() {
                return Err(ConfigError::InvalidValue(format!("domain {name} has no targets")));
            }
        }
        Ok(())
    }

    /// Resolved sources, targets and fill policy of `name`.
    pub fn domain_spec(&self, name: &str) -> ConfigResult<DomainSpec> {
        let domain = self.domains.get(name).ok_or_else(|| ConfigError::UnknownDomain(name.to_string()))?;
        let resolve = |p: &Path| if p.is_relative() { self.data_dir.join(p) } else { p.to_path_buf() };

        Ok(DomainSpec {
            name: name.to_string(),
            train: DatasetPair {
                features: CsvSource::with_index_column(resolve(&domain.train_features)),
                targets: CsvSource::new(resolve(&domain.train_targets)),
            },
            test: DatasetPair {
                features: CsvSource::with_index_column(resolve(&domain.test_features)),
                targets: CsvSource::new(resolve(&domain.test_targets)),
            },
            targets: domain.targets.clone(),
            target_fill: domain.target_fill.unwrap_or_else(|| default_target_fill(name)),
        })
    }

    #[must_use]
    pub fn model_layout(&self) -> ModelLayout {
        ModelLayout::new(self.model_dir.clone())
    }
}
