//! CLI error types.

use dbmirror_log::LogError;
use thiserror::Error;

/// CLI-level errors.
#[derive(Debug, Error)]
pub enum CtlError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad command line
    #[error("Usage: {0}")]
    Usage(String),

    /// Pending log error
    #[error("Pending log error: {0}")]
    Log(#[from] LogError),
}

/// Result type for CLI operations.
pub type CtlResult<T> = Result<T, CtlError>;
