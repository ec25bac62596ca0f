//! Domain errors

use thiserror::Error;

/// Errors raised by the pure capture layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The column policy needs a primary key and the table has none
    #[error("Table has no primary key")]
    MissingPrimaryKey,

    /// Row image does not line up with the table layout
    #[error("Row image has {actual} values, table layout has {expected} columns")]
    ArityMismatch {
        /// Number of columns in the schema
        expected: usize,
        /// Number of values in the row image
        actual: usize,
    },

    /// Unknown one-character operation code
    #[error("Invalid operation code: {0:?}")]
    InvalidOperationCode(char),

    /// Payload text does not follow the token grammar
    #[error("Malformed payload at byte {offset}: {reason}")]
    MalformedPayload {
        /// Byte offset where parsing stopped
        offset: usize,
        /// What was expected
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result alias for the domain layer.
pub type Result<T> = std::result::Result<T, CoreError>;
