use crate::config::ConfigError;
use aerocast_training::TrainingError;
use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Training(#[from] TrainingError),
}
