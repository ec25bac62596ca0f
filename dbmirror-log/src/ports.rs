//! Port definitions
//!
//! The capture layer only talks to the host through these traits.
//! Implementations:
//! - `MemorySession` - synthetic catalog and in-memory log (tests)
//! - `PgSession` - PostgreSQL catalog and log tables inside the caller's
//!   transaction (feature `postgres`)
//!
//! Methods take `&mut self` because a session wraps one connection that is
//! in the middle of a transaction.

use crate::error::LogError;
use crate::types::{HeaderId, NewHeader};
use async_trait::async_trait;
use dbmirror_core::{Payload, TableRef, TableSchema};

// =============================================================================
// Catalog Port
// =============================================================================

/// Read-only access to table metadata.
///
/// Nothing here is cached; every call goes to the catalog.
#[async_trait]
pub trait CatalogProvider: Send {
    /// Primary-key attribute numbers in key order.
    ///
    /// `Ok(None)` when the table exists but has no primary key.
    /// `Err(LogError::UnknownTable)` when the table does not exist.
    async fn primary_key(&mut self, table: &TableRef) -> Result<Option<Vec<i16>>, LogError>;

    /// Attribute numbers referenced by any foreign-key constraint on `table`.
    ///
    /// `Err(LogError::UnknownTable)` when the table does not exist.
    async fn foreign_key_columns(&mut self, table: &TableRef) -> Result<Vec<i16>, LogError>;

    /// Column layout of `table`, dropped columns included.
    ///
    /// `Ok(None)` when the table does not exist.
    async fn table_schema(&mut self, table: &TableRef) -> Result<Option<TableSchema>, LogError>;
}

// =============================================================================
// Pending Log Port
// =============================================================================

/// Append-only writer for the pending log.
///
/// Writes land in the session's transaction and become visible when the
/// caller commits.
#[async_trait]
pub trait PendingLogWriter: Send {
    /// Id of the transaction the session is running in
    async fn transaction_id(&mut self) -> Result<i64, LogError>;

    /// Insert one header and return its id
    async fn write_header(&mut self, header: &NewHeader) -> Result<HeaderId, LogError>;

    /// Insert one payload row owned by `header`
    async fn write_payload(
        &mut self,
        header: HeaderId,
        is_key: bool,
        payload: &Payload,
    ) -> Result<(), LogError>;
}

// =============================================================================
// Sequence Port
// =============================================================================

/// The host's native sequence primitives.
///
/// Sequence changes are not transactional: a rollback does not undo them.
#[async_trait]
pub trait SequencePort: Send {
    /// Set the value; the next advance returns `value + increment`
    async fn set_value(&mut self, sequence: &TableRef, value: i64) -> Result<i64, LogError>;

    /// Set the value and whether it has already been handed out
    async fn set_value_with_called(
        &mut self,
        sequence: &TableRef,
        value: i64,
        is_called: bool,
    ) -> Result<i64, LogError>;

    /// Advance and return the new value
    async fn next_value(&mut self, sequence: &TableRef) -> Result<i64, LogError>;
}
