//! Defines the error type for storage nodes and their configuration.
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Raised only at the edges of a node (configuration, export, balance
/// helpers). Stepping and accumulation never fail.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid node configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("Node '{name}' has no residual yet; call calculate first")]
    ResidualUnavailable { name: String },
    #[error("Node '{name}' is out of balance: residual {residual} exceeds tolerance {tolerance}")]
    BalanceExceeded { name: String, residual: f64, tolerance: f64 },
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        StorageError::InvalidConfig { field, reason: reason.into() }
    }
}
