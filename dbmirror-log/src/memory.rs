//! In-memory backend
//!
//! Used for testing without a database. The backend plays the host's role:
//! a synthetic catalog, native sequences, and the two log tables.
//! Writes go through a `MemorySession`, which stages them until `commit`;
//! dropping the session without committing is a rollback.

use crate::error::{LogError, Result};
use crate::ports::{CatalogProvider, PendingLogWriter, SequencePort};
use crate::types::{HeaderId, NewHeader, PendingData, PendingEntry, PendingHeader};
use async_trait::async_trait;
use dbmirror_core::{KeyTopology, Payload, TableRef, TableSchema};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Budget value meaning "never fail"
const UNLIMITED: usize = usize::MAX;

struct CatalogEntry {
    schema: TableSchema,
    topology: KeyTopology,
}

#[derive(Debug, Clone, Copy)]
struct SequenceState {
    value: i64,
    is_called: bool,
    increment: i64,
}

#[derive(Default)]
struct CommittedLog {
    headers: Vec<PendingHeader>,
    data: Vec<PendingData>,
}

/// In-memory host: catalog, sequences and committed pending log.
pub struct MemoryBackend {
    catalog: RwLock<HashMap<TableRef, CatalogEntry>>,
    sequences: RwLock<HashMap<TableRef, SequenceState>>,
    log: RwLock<CommittedLog>,
    next_seq_id: AtomicI64,
    next_xid: AtomicI64,
    write_budget: AtomicUsize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(HashMap::new()),
            sequences: RwLock::new(HashMap::new()),
            log: RwLock::new(CommittedLog::default()),
            next_seq_id: AtomicI64::new(1),
            next_xid: AtomicI64::new(1000),
            write_budget: AtomicUsize::new(UNLIMITED),
        }
    }

    /// Register a table layout with its keys.
    ///
    /// A topology with an empty primary key models a table without one.
    pub fn register_table(&self, schema: TableSchema, topology: KeyTopology) {
        let table = schema.table.clone();
        write(&self.catalog).insert(table, CatalogEntry { schema, topology });
    }

    /// Register a sequence whose first advance returns `start`
    pub fn register_sequence(&self, sequence: TableRef, start: i64) {
        write(&self.sequences).insert(
            sequence,
            SequenceState {
                value: start,
                is_called: false,
                increment: 1,
            },
        );
    }

    /// Current `(value, is_called)` of a sequence
    pub fn sequence_state(&self, sequence: &TableRef) -> Option<(i64, bool)> {
        read(&self.sequences)
            .get(sequence)
            .map(|s| (s.value, s.is_called))
    }

    /// Limit how many log inserts each new session may perform before
    /// failing; `None` removes the limit.
    pub fn set_write_budget(&self, writes: Option<usize>) {
        self.write_budget
            .store(writes.unwrap_or(UNLIMITED), Ordering::SeqCst);
    }

    /// Start a session with its own transaction id
    pub fn begin(&self) -> MemorySession<'_> {
        let xid = self.next_xid.fetch_add(1, Ordering::SeqCst);
        MemorySession {
            backend: self,
            xid,
            headers: Vec::new(),
            data: Vec::new(),
            writes_left: self.write_budget.load(Ordering::SeqCst),
        }
    }

    /// Number of committed headers
    pub fn header_count(&self) -> usize {
        read(&self.log).headers.len()
    }

    /// Number of committed payload rows
    pub fn data_count(&self) -> usize {
        read(&self.log).data.len()
    }

    /// Committed entries ordered by sequence id
    pub fn pending_entries(&self) -> Vec<PendingEntry> {
        let log = read(&self.log);
        let mut headers = log.headers.clone();
        headers.sort_by_key(|h| h.seq_id);

        headers
            .into_iter()
            .map(|header| {
                let data = log
                    .data
                    .iter()
                    .filter(|d| d.seq_id == header.seq_id)
                    .cloned()
                    .collect();
                PendingEntry { header, data }
            })
            .collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Session
// =============================================================================

/// One transaction against a `MemoryBackend`.
pub struct MemorySession<'a> {
    backend: &'a MemoryBackend,
    xid: i64,
    headers: Vec<PendingHeader>,
    data: Vec<PendingData>,
    writes_left: usize,
}

impl<'a> MemorySession<'a> {
    /// Publish staged rows to the backend
    pub fn commit(self) {
        let mut log = write(&self.backend.log);
        debug!(
            xid = self.xid,
            headers = self.headers.len(),
            rows = self.data.len(),
            "Memory session committed"
        );
        log.headers.extend(self.headers);
        log.data.extend(self.data);
    }

    /// Discard staged rows
    pub fn rollback(self) {
        debug!(xid = self.xid, "Memory session rolled back");
    }

    /// Rows staged so far as `(headers, payload rows)`
    pub fn staged(&self) -> (usize, usize) {
        (self.headers.len(), self.data.len())
    }

    fn spend_write(&mut self) -> Result<()> {
        if self.writes_left == 0 {
            return Err(LogError::Database("write budget exhausted".to_string()));
        }
        if self.writes_left != UNLIMITED {
            self.writes_left -= 1;
        }
        Ok(())
    }

    fn with_sequence<F>(&self, sequence: &TableRef, apply: F) -> Result<i64>
    where
        F: FnOnce(&mut SequenceState) -> i64,
    {
        let mut sequences = write(&self.backend.sequences);
        let state = sequences
            .get_mut(sequence)
            .ok_or_else(|| LogError::UnknownSequence(sequence.to_string()))?;
        Ok(apply(state))
    }
}

#[async_trait]
impl<'a> CatalogProvider for MemorySession<'a> {
    async fn primary_key(&mut self, table: &TableRef) -> Result<Option<Vec<i16>>> {
        let catalog = read(&self.backend.catalog);
        let entry = catalog
            .get(table)
            .ok_or_else(|| LogError::UnknownTable(table.to_string()))?;

        let primary_key = entry.topology.primary_key();
        Ok((!primary_key.is_empty()).then(|| primary_key.to_vec()))
    }

    async fn foreign_key_columns(&mut self, table: &TableRef) -> Result<Vec<i16>> {
        let catalog = read(&self.backend.catalog);
        let entry = catalog
            .get(table)
            .ok_or_else(|| LogError::UnknownTable(table.to_string()))?;

        Ok(entry.topology.foreign_keys().iter().copied().collect())
    }

    async fn table_schema(&mut self, table: &TableRef) -> Result<Option<TableSchema>> {
        Ok(read(&self.backend.catalog)
            .get(table)
            .map(|entry| entry.schema.clone()))
    }
}

#[async_trait]
impl<'a> PendingLogWriter for MemorySession<'a> {
    async fn transaction_id(&mut self) -> Result<i64> {
        Ok(self.xid)
    }

    async fn write_header(&mut self, header: &NewHeader) -> Result<HeaderId> {
        self.spend_write()?;

        // ids are handed out even if the session later rolls back
        let seq_id = self.backend.next_seq_id.fetch_add(1, Ordering::SeqCst);
        self.headers.push(PendingHeader {
            seq_id,
            table_name: header.table_name.clone(),
            operation: header.operation,
            xid: header.xid,
        });

        Ok(HeaderId(seq_id))
    }

    async fn write_payload(
        &mut self,
        header: HeaderId,
        is_key: bool,
        payload: &Payload,
    ) -> Result<()> {
        if !self.headers.iter().any(|h| h.id() == header) {
            return Err(LogError::UnknownHeader(header));
        }
        self.spend_write()?;

        self.data.push(PendingData {
            seq_id: header.as_i64(),
            is_key,
            data: payload.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl<'a> SequencePort for MemorySession<'a> {
    async fn set_value(&mut self, sequence: &TableRef, value: i64) -> Result<i64> {
        self.set_value_with_called(sequence, value, true).await
    }

    async fn set_value_with_called(
        &mut self,
        sequence: &TableRef,
        value: i64,
        is_called: bool,
    ) -> Result<i64> {
        self.with_sequence(sequence, |state| {
            state.value = value;
            state.is_called = is_called;
            value
        })
    }

    async fn next_value(&mut self, sequence: &TableRef) -> Result<i64> {
        self.with_sequence(sequence, |state| {
            if state.is_called {
                state.value += state.increment;
            }
            state.is_called = true;
            state.value
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmirror_core::Operation;

    fn backend_with_table() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.register_table(
            TableSchema::new(TableRef::new("public", "t"))
                .with_column("id")
                .with_column("name"),
            KeyTopology::new(vec![1], []),
        );
        backend
    }

    #[tokio::test]
    async fn test_commit_publishes_rows() {
        let backend = MemoryBackend::new();
        let mut session = backend.begin();

        let header = session
            .write_header(&NewHeader::new("\"public\".\"t\"", Operation::Insert, 1))
            .await
            .unwrap();
        session
            .write_payload(header, false, &Payload::from_text("\"id\"='1' "))
            .await
            .unwrap();

        assert_eq!(backend.header_count(), 0);
        session.commit();

        let entries = backend.pending_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].header.id(), header);
        assert_eq!(entries[0].data.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_rows() {
        let backend = MemoryBackend::new();

        let mut session = backend.begin();
        session
            .write_header(&NewHeader::new("t", Operation::Delete, 1))
            .await
            .unwrap();
        session.rollback();

        {
            let mut session = backend.begin();
            session
                .write_header(&NewHeader::new("t", Operation::Delete, 1))
                .await
                .unwrap();
        }

        assert_eq!(backend.header_count(), 0);
        assert_eq!(backend.data_count(), 0);
    }

    #[tokio::test]
    async fn test_payload_needs_session_header() {
        let backend = MemoryBackend::new();
        let mut session = backend.begin();

        let result = session
            .write_payload(HeaderId(99), true, &Payload::from_text(""))
            .await;
        assert!(matches!(result, Err(LogError::UnknownHeader(HeaderId(99)))));
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_xids() {
        let backend = MemoryBackend::new();
        let mut first = backend.begin();
        let mut second = backend.begin();

        assert_ne!(
            first.transaction_id().await.unwrap(),
            second.transaction_id().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_write_budget() {
        let backend = MemoryBackend::new();
        backend.set_write_budget(Some(1));
        let mut session = backend.begin();

        let header = session
            .write_header(&NewHeader::new("t", Operation::Insert, 1))
            .await
            .unwrap();
        let result = session
            .write_payload(header, false, &Payload::from_text(""))
            .await;

        assert!(matches!(result, Err(LogError::Database(_))));
        assert_eq!(session.staged(), (1, 0));
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let backend = backend_with_table();
        let mut session = backend.begin();
        let table = TableRef::new("public", "t");

        assert_eq!(session.primary_key(&table).await.unwrap(), Some(vec![1]));
        assert!(session.foreign_key_columns(&table).await.unwrap().is_empty());
        assert_eq!(
            session.table_schema(&table).await.unwrap().map(|s| s.arity()),
            Some(2)
        );

        let missing = TableRef::new("public", "nope");
        assert!(matches!(
            session.primary_key(&missing).await,
            Err(LogError::UnknownTable(_))
        ));
        assert!(session.table_schema(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_without_primary_key() {
        let backend = MemoryBackend::new();
        backend.register_table(
            TableSchema::new(TableRef::new("public", "log")).with_column("line"),
            KeyTopology::default(),
        );
        let mut session = backend.begin();

        let pk = session
            .primary_key(&TableRef::new("public", "log"))
            .await
            .unwrap();
        assert_eq!(pk, None);
    }

    #[tokio::test]
    async fn test_sequence_primitives() {
        let backend = MemoryBackend::new();
        let seq = TableRef::new("public", "s");
        backend.register_sequence(seq.clone(), 1);
        let mut session = backend.begin();

        assert_eq!(session.next_value(&seq).await.unwrap(), 1);
        assert_eq!(session.next_value(&seq).await.unwrap(), 2);
        assert_eq!(session.set_value(&seq, 10).await.unwrap(), 10);
        assert_eq!(session.next_value(&seq).await.unwrap(), 11);
        assert_eq!(
            session.set_value_with_called(&seq, 20, false).await.unwrap(),
            20
        );
        assert_eq!(session.next_value(&seq).await.unwrap(), 20);

        // not undone by rollback
        session.rollback();
        assert_eq!(backend.sequence_state(&seq), Some((20, true)));
    }

    #[tokio::test]
    async fn test_unknown_sequence() {
        let backend = MemoryBackend::new();
        let mut session = backend.begin();

        let result = session.next_value(&TableRef::new("public", "missing")).await;
        assert!(matches!(result, Err(LogError::UnknownSequence(_))));
    }
}
