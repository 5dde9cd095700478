//! Error types shared across the crate.

use thiserror::Error;

/// Errors that can occur while setting up or running a training session
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration, detected at session start
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reproduction could not fill the next population
    #[error("generation starvation: {0}")]
    GenerationStarvation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SimError>;
