//! Error types for the worklog pipeline.

use thiserror::Error;

/// Errors that can occur while building or publishing a work log.
#[derive(Error, Debug)]
pub enum WorklogError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Carries the secret's label only, never its value.
    #[error("Security alert: secret leak detected ({label}), refusing to publish")]
    LeakDetected { label: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for worklog operations.
pub type WorklogResult<T> = Result<T, WorklogError>;
