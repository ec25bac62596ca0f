//! Pending log record types

use dbmirror_core::{Operation, Payload};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a written header (`dbmirror_pending.seqid`).
///
/// Returned by the header write and passed to every payload write for
/// that event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeaderId(pub i64);

impl HeaderId {
    /// Raw sequence id
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Header about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHeader {
    /// Rendered table (or sequence) name
    pub table_name: String,
    /// Captured operation
    pub operation: Operation,
    /// Transaction the event belongs to
    pub xid: i64,
}

impl NewHeader {
    /// Create a new header
    pub fn new(table_name: impl Into<String>, operation: Operation, xid: i64) -> Self {
        Self {
            table_name: table_name.into(),
            operation,
            xid,
        }
    }
}

/// Header as stored in `dbmirror_pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHeader {
    /// Assigned by the store, increasing
    pub seq_id: i64,
    /// Rendered table (or sequence) name
    pub table_name: String,
    /// Captured operation
    pub operation: Operation,
    /// Transaction the event belongs to
    pub xid: i64,
}

impl PendingHeader {
    /// Identifier to link payloads against
    pub fn id(&self) -> HeaderId {
        HeaderId(self.seq_id)
    }
}

/// Payload row as stored in `dbmirror_pendingdata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingData {
    /// Owning header
    pub seq_id: i64,
    /// Key image (`true`) or full row image (`false`)
    pub is_key: bool,
    /// Encoded columns
    pub data: Payload,
}

/// A header together with its payload rows, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    /// Event header
    pub header: PendingHeader,
    /// Payload rows
    pub data: Vec<PendingData>,
}

impl PendingEntry {
    /// The key payload, if the entry has one
    pub fn key_data(&self) -> Option<&PendingData> {
        self.data.iter().find(|d| d.is_key)
    }

    /// The full row payload, if the entry has one
    pub fn row_data(&self) -> Option<&PendingData> {
        self.data.iter().find(|d| !d.is_key)
    }
}
