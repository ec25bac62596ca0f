//! Pending payload encoding
//!
//! Builds the canonical text form of a row image. The output of
//! [`encode_row`] is what lands in `dbmirror_pendingdata.data`.

use crate::error::{CoreError, Result};
use crate::table::{RowImage, TableSchema};
use crate::usage::{ColumnUsage, KeyTopology};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Starting capacity of a payload buffer
const INITIAL_CAPACITY: usize = 256;

// =============================================================================
// Payload
// =============================================================================

/// Encoded payload text.
///
/// Always valid UTF-8: it is assembled from column names, row values and
/// ASCII delimiters only. Stored as `text`, whose varlena header carries the
/// length, so no separate prefix is added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// Wrap text read back from the log
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Payload text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a payload with no tokens
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// PayloadBuilder
// =============================================================================

/// Append-only builder for payload text.
#[derive(Debug)]
pub struct PayloadBuilder {
    buf: String,
}

impl PayloadBuilder {
    /// Create a builder with the default starting capacity
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create a builder with an explicit starting capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Append one `"name"=value ` token.
    pub fn push_column(&mut self, name: &str, value: Option<&str>) {
        // name, quotes, '=', value quotes and trailing space
        let needed = name.len() + value.map_or(1, |v| v.len() + 3) + 3;
        self.buf.reserve(needed);

        self.buf.push('"');
        self.buf.push_str(name);
        self.buf.push_str("\"=");

        match value {
            None => self.buf.push(' '),
            Some(value) => {
                self.buf.push('\'');
                escape_value(value, &mut self.buf);
                self.buf.push_str("' ");
            },
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the payload, releasing unused capacity
    pub fn finish(mut self) -> Payload {
        self.buf.shrink_to_fit();
        Payload(self.buf)
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `value` into `out`, doubling every `\` and `'`.
pub fn escape_value(value: &str, out: &mut String) {
    let mut rest = value;
    while let Some(pos) = rest.find(&['\\', '\''][..]) {
        let (head, tail) = rest.split_at(pos + 1);
        out.push_str(head);
        // the byte at `pos` is ASCII, so the split above is on a char boundary
        out.push_str(&head[pos..]);
        rest = tail;
    }
    out.push_str(rest);
}

// =============================================================================
// Row encoding
// =============================================================================

/// Encode the columns of `row` selected by `usage`.
///
/// `topology` is only consulted for policies that need key information; it
/// may be `None` for `AllColumns`.
///
/// # Errors
/// - `CoreError::MissingPrimaryKey` if the policy needs a primary key and
///   `topology` has none
/// - `CoreError::ArityMismatch` if the row does not match the layout
pub fn encode_row(
    schema: &TableSchema,
    row: &RowImage,
    usage: ColumnUsage,
    topology: Option<&KeyTopology>,
) -> Result<Payload> {
    let topology = match topology {
        Some(t) if t.has_primary_key() => Some(t),
        _ if usage.needs_primary_key() => return Err(CoreError::MissingPrimaryKey),
        _ => None,
    };

    if row.len() != schema.arity() {
        return Err(CoreError::ArityMismatch {
            expected: schema.arity(),
            actual: row.len(),
        });
    }

    let mut builder = PayloadBuilder::new();

    for column in schema.live_columns() {
        let (is_primary, is_foreign) = topology
            .map(|t| (t.is_primary(column.ordinal), t.is_foreign(column.ordinal)))
            .unwrap_or((false, false));

        if !usage.includes(is_primary, is_foreign) {
            continue;
        }

        builder.push_column(&column.name, row.value(column.ordinal));
    }

    Ok(builder.finish())
}

/// Encode a sequence update as `<value>,'t'` or `<value>,'f'`.
pub fn encode_sequence(value: i64, is_called: bool) -> Payload {
    Payload(format!("{},'{}'", value, if is_called { 't' } else { 'f' }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRef;
    use proptest::prelude::*;

    fn people() -> TableSchema {
        TableSchema::new(TableRef::new("public", "t"))
            .with_column("id")
            .with_column("name")
    }

    /// order_id (FK), line (PK part), order_no (PK part), dropped slot, qty
    fn order_lines() -> (TableSchema, KeyTopology) {
        let schema = TableSchema::new(TableRef::new("shop", "order_lines"))
            .with_column("order_id")
            .with_column("line")
            .with_column("order_no")
            .with_dropped_column("old_price")
            .with_column("qty");
        let topology = KeyTopology::new(vec![3, 2], [1]);
        (schema, topology)
    }

    fn escaped(value: &str) -> String {
        let mut out = String::new();
        escape_value(value, &mut out);
        out
    }

    #[test]
    fn test_insert_payload_escapes_apostrophe() {
        let row = RowImage::from_values([Some("1"), Some("O'Brien")]);
        let payload = encode_row(&people(), &row, ColumnUsage::AllColumns, None).unwrap();

        assert_eq!(payload.as_str(), r#""id"='1' "name"='O''Brien' "#);
    }

    #[test]
    fn test_backslash_is_doubled() {
        let row = RowImage::from_values([Some("1"), Some(r"A\B")]);
        let payload = encode_row(&people(), &row, ColumnUsage::AllColumns, None).unwrap();

        assert_eq!(payload.as_str(), r#""id"='1' "name"='A\\B' "#);
    }

    #[test]
    fn test_null_is_single_space() {
        let row = RowImage::from_values([Some("1"), None]);
        let payload = encode_row(&people(), &row, ColumnUsage::AllColumns, None).unwrap();

        assert_eq!(payload.as_str(), r#""id"='1' "name"= "#);
    }

    #[test]
    fn test_empty_string_keeps_quotes() {
        let row = RowImage::from_values([Some("1"), Some("")]);
        let payload = encode_row(&people(), &row, ColumnUsage::AllColumns, None).unwrap();

        assert_eq!(payload.as_str(), r#""id"='1' "name"='' "#);
    }

    #[test]
    fn test_keys_only_needs_primary_key() {
        let row = RowImage::from_values([Some("1"), Some("x")]);

        let none = encode_row(&people(), &row, ColumnUsage::KeysOnly, None);
        assert_eq!(none, Err(CoreError::MissingPrimaryKey));

        let empty = KeyTopology::default();
        let result = encode_row(&people(), &row, ColumnUsage::NonKeyColumns, Some(&empty));
        assert_eq!(result, Err(CoreError::MissingPrimaryKey));
    }

    #[test]
    fn test_keys_only_in_schema_order() {
        let (schema, _) = order_lines();
        // without foreign keys resolved, both PK columns are captured
        let topology = KeyTopology::new(vec![3, 2], []);
        let row =
            RowImage::from_values([Some("7"), Some("1"), Some("A-7"), Some("9.99"), Some("2")]);

        let payload = encode_row(&schema, &row, ColumnUsage::KeysOnly, Some(&topology)).unwrap();
        assert_eq!(payload.as_str(), r#""line"='1' "order_no"='A-7' "#);
    }

    #[test]
    fn test_key_and_foreign_is_union() {
        let (schema, topology) = order_lines();
        let row =
            RowImage::from_values([Some("7"), Some("1"), Some("A-7"), Some("9.99"), Some("2")]);

        let payload =
            encode_row(&schema, &row, ColumnUsage::KeyAndForeignColumns, Some(&topology)).unwrap();
        assert_eq!(
            payload.as_str(),
            r#""order_id"='7' "line"='1' "order_no"='A-7' "#
        );
    }

    #[test]
    fn test_non_key_columns_skip_dropped() {
        let (schema, topology) = order_lines();
        let row =
            RowImage::from_values([Some("7"), Some("1"), Some("A-7"), Some("9.99"), Some("2")]);

        let payload =
            encode_row(&schema, &row, ColumnUsage::NonKeyColumns, Some(&topology)).unwrap();
        assert_eq!(payload.as_str(), r#""order_id"='7' "qty"='2' "#);
    }

    #[test]
    fn test_all_columns_skip_dropped() {
        let (schema, _) = order_lines();
        let row =
            RowImage::from_values([Some("7"), Some("1"), Some("A-7"), Some("9.99"), None]);

        let payload = encode_row(&schema, &row, ColumnUsage::AllColumns, None).unwrap();
        assert!(!payload.as_str().contains("old_price"));
        assert!(payload.as_str().ends_with(r#""qty"= "#));
    }

    #[test]
    fn test_arity_mismatch() {
        let row = RowImage::from_values([Some("1")]);
        let result = encode_row(&people(), &row, ColumnUsage::AllColumns, None);

        assert_eq!(
            result,
            Err(CoreError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_builder_grows_past_initial_capacity() {
        let long = "x'".repeat(INITIAL_CAPACITY);
        let mut builder = PayloadBuilder::with_capacity(8);
        builder.push_column("v", Some(&long));

        let payload = builder.finish();
        assert_eq!(payload.len(), "\"v\"=".len() + 2 + long.len() + INITIAL_CAPACITY + 1);
    }

    #[test]
    fn test_sequence_payload() {
        assert_eq!(encode_sequence(42, true).as_str(), "42,'t'");
        assert_eq!(encode_sequence(-3, false).as_str(), "-3,'f'");
    }

    proptest! {
        #[test]
        fn prop_escaping_cost_law(value in "[^\\x00]{0,64}") {
            let specials = value.bytes().filter(|b| *b == b'\\' || *b == b'\'').count();
            prop_assert_eq!(escaped(&value).len(), value.len() + specials);
        }

        #[test]
        fn prop_escape_only_touches_specials(value in "[a-zA-Z0-9 ,.\"=]{0,64}") {
            prop_assert_eq!(escaped(&value), value);
        }
    }
}
