//! Operation kinds
//!
//! `TriggerEvent` is what the host reports; `Operation` is what gets logged.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation recorded in a pending header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
    /// Sequence value set or advanced
    SequenceAdvance,
}

impl Operation {
    /// One-character code stored in the `op` column
    pub fn code(self) -> char {
        match self {
            Operation::Insert => 'i',
            Operation::Update => 'u',
            Operation::Delete => 'd',
            Operation::SequenceAdvance => 's',
        }
    }

    /// Parse a stored code
    ///
    /// # Errors
    /// Returns `CoreError::InvalidOperationCode` for anything outside `i`, `u`, `d`, `s`.
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'i' => Ok(Operation::Insert),
            'u' => Ok(Operation::Update),
            'd' => Ok(Operation::Delete),
            's' => Ok(Operation::SequenceAdvance),
            other => Err(CoreError::InvalidOperationCode(other)),
        }
    }

    /// Code as a string slice, for binding
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "i",
            Operation::Update => "u",
            Operation::Delete => "d",
            Operation::SequenceAdvance => "s",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert => write!(f, "insert"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::SequenceAdvance => write!(f, "sequence-advance"),
        }
    }
}

/// Statement kind a row trigger fired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    /// INSERT
    Insert,
    /// UPDATE
    Update,
    /// DELETE
    Delete,
    /// TRUNCATE (never captured)
    Truncate,
}

impl TriggerEvent {
    /// Operation to log, or `None` when the event is not captured
    pub fn operation(self) -> Option<Operation> {
        match self {
            TriggerEvent::Insert => Some(Operation::Insert),
            TriggerEvent::Update => Some(Operation::Update),
            TriggerEvent::Delete => Some(Operation::Delete),
            TriggerEvent::Truncate => None,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::Insert => write!(f, "INSERT"),
            TriggerEvent::Update => write!(f, "UPDATE"),
            TriggerEvent::Delete => write!(f, "DELETE"),
            TriggerEvent::Truncate => write!(f, "TRUNCATE"),
        }
    }
}
