//! Error types for the anomaly core.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AnomalyError>;

#[derive(Error, Debug)]
pub enum AnomalyError {
    /// `predict` was called before `fit`.
    #[error("Model must be fitted before making predictions")]
    NotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidConfig {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AnomalyError {
    fn from(err: serde_json::Error) -> Self {
        AnomalyError::InvalidInput(err.to_string())
    }
}
