//! dbmirror Domain Layer
//!
//! Pure change-capture logic with zero I/O dependencies:
//! table and row model, operation codes, column usage policies,
//! key topology, and the pending payload codec.
//!
//! # Payload grammar
//!
//! A payload is a run of `"<column>"=<value> ` tokens in schema order.
//! A null value is a single space; anything else is quoted with `'` and has
//! every `'` and `\` doubled:
//!
//! ```rust
//! use dbmirror_core::{encode_row, ColumnUsage, RowImage, TableRef, TableSchema};
//!
//! let schema = TableSchema::new(TableRef::new("public", "t"))
//!     .with_column("id")
//!     .with_column("name");
//! let row = RowImage::from_values([Some("1"), Some("O'Brien")]);
//!
//! let payload = encode_row(&schema, &row, ColumnUsage::AllColumns, None).unwrap();
//! assert_eq!(payload.as_str(), r#""id"='1' "name"='O''Brien' "#);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod operation;
pub mod table;
pub mod usage;

pub use decoder::{decode_payload, decode_sequence, DecodedColumn, SequenceValue};
pub use encoder::{encode_row, encode_sequence, escape_value, Payload, PayloadBuilder};
pub use error::{CoreError, Result};
pub use operation::{Operation, TriggerEvent};
pub use table::{ColumnDef, RowImage, TableRef, TableSchema};
pub use usage::{ColumnUsage, KeyTopology};
