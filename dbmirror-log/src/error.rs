//! Pending log errors

use crate::types::HeaderId;
use dbmirror_core::CoreError;
use thiserror::Error;

/// Errors raised by log backends
#[derive(Debug, Error)]
pub enum LogError {
    /// Insert or catalog query failed
    #[error("Database error: {0}")]
    Database(String),

    /// Payload written against a header this session did not create
    #[error("Unknown pending header: {0}")]
    UnknownHeader(HeaderId),

    /// Relation missing from the catalog
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Sequence missing from the catalog
    #[error("Unknown sequence: {0}")]
    UnknownSequence(String),

    /// Stored row could not be read back
    #[error("Corrupt pending row {seq_id}: {source}")]
    Corrupt {
        /// Header the row belongs to
        seq_id: i64,
        /// Decoding failure
        source: CoreError,
    },
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // undefined_table: the log tables were never migrated
                if db_err.code().map(|c| c == "42P01").unwrap_or(false) {
                    LogError::Database(format!(
                        "{} (run `dbmirrorctl db migrate` first)",
                        db_err.message()
                    ))
                } else {
                    LogError::Database(db_err.to_string())
                }
            },
            _ => LogError::Database(err.to_string()),
        }
    }
}

/// Result alias for log operations
pub type Result<T> = std::result::Result<T, LogError>;
