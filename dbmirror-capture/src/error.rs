//! Capture error types.

use dbmirror_core::{CoreError, TriggerEvent};
use dbmirror_log::LogError;
use thiserror::Error;

/// Capture errors. All of them abort the triggering statement.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Key image requested for a table without a primary key
    #[error("There is no PRIMARY KEY for table {table}")]
    MissingPrimaryKey {
        /// Rendered table name
        table: String,
    },

    /// Pending header or data insert failed
    #[error("Operation could not be mirrored: {0}")]
    LogWrite(#[source] LogError),

    /// Key topology lookup failed
    #[error("Catalog lookup failed: {0}")]
    Catalog(#[source] LogError),

    /// Native sequence primitive failed
    #[error("Sequence operation failed: {0}")]
    Sequence(#[source] LogError),

    /// Trigger fired for something other than INSERT, UPDATE or DELETE
    #[error("Unsupported trigger operation: {0}")]
    UnsupportedOperation(TriggerEvent),

    /// The host did not hand over an image the operation needs
    #[error("{event} on {table} has no {image} row image")]
    MissingRowImage {
        /// Trigger event
        event: TriggerEvent,
        /// Rendered table name
        table: String,
        /// "before" or "after"
        image: &'static str,
    },

    /// Row image could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] CoreError),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
