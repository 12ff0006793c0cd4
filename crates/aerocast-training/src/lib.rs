//! Aerocast Training
//!
//! Streaming primitives for per-target online regression:
//! - Windowed dataset reading (`DatasetCursor`) into reusable `Frame`s
//! - Per-window imputation and feature standardization
//! - Online regressors and the per-target `ModelSet`
//! - Model snapshots, training manifests and regression metrics
//! - The `Trainer` contract implemented by concrete orchestrators

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod frame;
pub mod impute;
pub mod job;
pub mod layout;
pub mod metrics;
pub mod models;
pub mod progress;
pub mod regressor;
pub mod scaler;
pub mod store;
pub mod trainer;

pub use artifacts::{make_artifact, TrainingArtifact, TrainingManifest};
pub use dataset::{CsvSource, DatasetCursor, DatasetRole, WindowStatus};
pub use error::{TrainingError, TrainingResult};
pub use frame::Frame;
pub use impute::{FillPolicy, ImputeSummary, Imputer};
pub use job::{DatasetPair, DomainSpec, TrainingJob, TrainingJobId};
pub use layout::ModelLayout;
pub use metrics::RegressionMetrics;
pub use models::ModelSet;
pub use progress::{ProgressEvent, ProgressSink, TracingProgressSink};
pub use regressor::{
    LearningRate, OnlineRegressor, PassiveAggressiveParams, PassiveAggressiveRegressor, Regressor, RegressorSpec,
    SgdParams, SgdRegressor,
};
pub use scaler::{RunningScaler, ScalerMode, ScalerState, StandardScaler};
pub use store::{FsModelStore, ModelSnapshot, ModelStore};
pub use trainer::{Trainer, TrainerStatus};
