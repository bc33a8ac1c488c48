//! Stagehand host — error types.

use stagehand_core::error::StageError;
use thiserror::Error;

/// Startup and runtime errors for the host.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML configuration file is malformed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The curtain gate or scene manager reported an error.
    #[error(transparent)]
    Stage(#[from] StageError),
}
