//! Error types for the training library
//!
//! Recoverable failures (unreadable data, bad checkpoints, invalid
//! configuration, worker faults) are reported through [`NetworkError`].
//! Shape mismatches and other caller bugs are assertions, not errors.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum NetworkError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Checkpoint encoding or decoding failed
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] bincode::Error),

    /// JSON configuration could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Adjacent layers do not line up, or a layer's element counts are wrong
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Checkpoint has an unsupported format version or no layers
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    /// A data record could not be turned into a sample
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Sample label does not fit the network's output width
    #[error("label {label} out of range for output width {width}")]
    LabelOutOfRange { label: u32, width: usize },

    /// A job panicked on a worker thread
    #[error("worker fault: {0}")]
    WorkerFault(String),

    /// Work was submitted after the pool started shutting down
    #[error("worker pool is shut down")]
    PoolShutdown,
}

impl NetworkError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        NetworkError::InvalidConfig(msg.into())
    }

    pub(crate) fn invalid_checkpoint(msg: impl Into<String>) -> Self {
        NetworkError::InvalidCheckpoint(msg.into())
    }

    pub(crate) fn dimension_mismatch(msg: impl Into<String>) -> Self {
        NetworkError::DimensionMismatch(msg.into())
    }
}
