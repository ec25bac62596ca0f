//! Table identity, column layout and row images.
//!
//! Column ordinals are 1-based, matching the host catalog's attribute
//! numbers, so key topology and layout can be compared directly.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TableRef
// =============================================================================

/// Identity of a relation (table or sequence) in the host catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    /// Namespace the relation lives in
    pub schema: String,
    /// Relation name
    pub name: String,
}

impl TableRef {
    /// Create a new table reference
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Render the name as stored in the pending log.
    ///
    /// `"schema"."name"` when `qualify_schema` is set, `"name"` otherwise.
    pub fn quoted(&self, qualify_schema: bool) -> String {
        if qualify_schema {
            format!("\"{}\".\"{}\"", self.schema, self.name)
        } else {
            format!("\"{}\"", self.name)
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

// =============================================================================
// Layout
// =============================================================================

/// One attribute of a table layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// 1-based attribute number
    pub ordinal: i16,
    /// Column name
    pub name: String,
    /// Dropped columns keep their slot but are never captured
    pub dropped: bool,
}

/// Column layout of a table, in attribute order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table identity
    pub table: TableRef,
    /// Columns in attribute order, dropped ones included
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Create an empty layout for `table`
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    /// Append a live column at the next ordinal
    pub fn with_column(self, name: impl Into<String>) -> Self {
        self.push(name.into(), false)
    }

    /// Append a dropped column at the next ordinal
    pub fn with_dropped_column(self, name: impl Into<String>) -> Self {
        self.push(name.into(), true)
    }

    fn push(mut self, name: String, dropped: bool) -> Self {
        let ordinal = self.columns.len() as i16 + 1;
        self.columns.push(ColumnDef {
            ordinal,
            name,
            dropped,
        });
        self
    }

    /// Number of attribute slots, dropped ones included
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Columns that are still part of the table
    pub fn live_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.dropped)
    }
}

// =============================================================================
// RowImage
// =============================================================================

/// Text rendering of one row at one point in a statement.
///
/// One slot per attribute (dropped slots included); `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowImage {
    values: Vec<Option<String>>,
}

impl RowImage {
    /// Create a row image from owned values
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Create a row image from borrowed values
    pub fn from_values<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.map(str::to_string)).collect(),
        }
    }

    /// Value at a 1-based ordinal; `None` for NULL or an out-of-range slot
    pub fn value(&self, ordinal: i16) -> Option<&str> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the image has no slots
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<Option<String>> for RowImage {
    fn from_iter<I: IntoIterator<Item = Option<String>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_rendering() {
        let table = TableRef::new("public", "t");
        assert_eq!(table.quoted(true), r#""public"."t""#);
        assert_eq!(table.quoted(false), r#""t""#);
    }

    #[test]
    fn test_schema_ordinals_are_one_based() {
        let schema = TableSchema::new(TableRef::new("public", "t"))
            .with_column("id")
            .with_dropped_column("legacy")
            .with_column("name");

        let ordinals: Vec<i16> = schema.columns.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(schema.arity(), 3);
        assert_eq!(schema.live_columns().count(), 2);
    }

    #[test]
    fn test_row_image_value_lookup() {
        let row = RowImage::from_values([Some("1"), None, Some("x")]);
        assert_eq!(row.value(1), Some("1"));
        assert_eq!(row.value(2), None);
        assert_eq!(row.value(3), Some("x"));
        assert_eq!(row.value(0), None);
        assert_eq!(row.value(4), None);
        assert_eq!(row.value(-1), None);
    }

    #[test]
    fn test_schema_serializes() {
        let schema = TableSchema::new(TableRef::new("public", "t")).with_column("id");
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["table"]["name"], "t");
        assert_eq!(json["columns"][0]["ordinal"], 1);
    }
}
