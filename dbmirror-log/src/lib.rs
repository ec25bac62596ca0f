//! dbmirror Pending Log
//!
//! Storage side of change capture.
//!
//! # Architecture
//!
//! - **Ports**: `CatalogProvider`, `PendingLogWriter`, `SequencePort`
//! - **In-memory backend**: transactional sessions over plain collections, for tests
//! - **PostgreSQL backend**: `PgSession` over the caller's transaction (feature `postgres`)
//!
//! # Usage
//!
//! ```rust
//! use dbmirror_core::{Operation, Payload};
//! use dbmirror_log::{MemoryBackend, NewHeader, PendingLogWriter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!     let mut session = backend.begin();
//!
//!     let xid = session.transaction_id().await.unwrap();
//!     let header = session
//!         .write_header(&NewHeader::new("\"public\".\"t\"", Operation::Insert, xid))
//!         .await
//!         .unwrap();
//!     session
//!         .write_payload(header, false, &Payload::from_text("\"id\"='1' "))
//!         .await
//!         .unwrap();
//!     session.commit();
//!
//!     assert_eq!(backend.header_count(), 1);
//! }
//! ```

#![warn(clippy::all)]

mod error;
mod memory;
mod ports;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
mod query;
mod types;

pub use error::{LogError, Result};
pub use memory::{MemoryBackend, MemorySession};
pub use ports::{CatalogProvider, PendingLogWriter, SequencePort};
#[cfg(feature = "postgres")]
pub use postgres::{PgSession, PENDING_DATA_TABLE, PENDING_TABLE};
#[cfg(feature = "postgres")]
pub use query::{query_pending, PendingQuery};
pub use types::{HeaderId, NewHeader, PendingData, PendingEntry, PendingHeader};
