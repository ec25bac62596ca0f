//! dbmirror Capture
//!
//! Records row changes and sequence updates into the pending log, inside the
//! transaction that makes them.
//!
//! # Flow
//!
//! ```text
//! row trigger → ChangeEventRouter → KeyTopologyResolver → encode_row → PendingLogWriter
//! setval/nextval → SequenceMirror → SequencePort → PendingLogWriter
//! ```
//!
//! # Example
//!
//! ```rust
//! use dbmirror_capture::{CaptureOptions, ChangeEventRouter, RowChange};
//! use dbmirror_core::{KeyTopology, RowImage, TableRef, TableSchema};
//! use dbmirror_log::MemoryBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let schema = TableSchema::new(TableRef::new("public", "t"))
//!         .with_column("id")
//!         .with_column("name");
//!     let backend = MemoryBackend::new();
//!     backend.register_table(schema.clone(), KeyTopology::new(vec![1], []));
//!
//!     let router = ChangeEventRouter::new(CaptureOptions::default());
//!     let row = RowImage::from_values([Some("1"), Some("O'Brien")]);
//!
//!     let mut session = backend.begin();
//!     router.record(&mut session, &RowChange::insert(&schema, &row)).await.unwrap();
//!     session.commit();
//!
//!     assert_eq!(backend.data_count(), 1);
//! }
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod options;
pub mod resolver;
pub mod router;
pub mod sequence;

pub use error::{CaptureError, CaptureResult};
pub use options::CaptureOptions;
pub use resolver::KeyTopologyResolver;
pub use router::{ChangeEventRouter, RowChange};
pub use sequence::SequenceMirror;
