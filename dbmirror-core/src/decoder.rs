//! Consumer-side payload decoding
//!
//! Inverse of [`crate::encoder`]. Column names are read up to the first
//! `"=`, so names containing that sequence cannot be recovered.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// One column read back from a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedColumn {
    /// Column name
    pub name: String,
    /// Column value, `None` for NULL
    pub value: Option<String>,
}

/// Sequence state read back from a sequence payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceValue {
    /// Value the sequence was set or advanced to
    pub value: i64,
    /// Whether the value counts as already handed out
    pub is_called: bool,
}

/// Parse a row payload into its columns, in payload order.
///
/// # Errors
/// `CoreError::MalformedPayload` with the byte offset of the first token
/// that does not fit the grammar.
pub fn decode_payload(text: &str) -> Result<Vec<DecodedColumn>> {
    let bytes = text.as_bytes();
    let mut columns = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'"' {
            return Err(CoreError::malformed(pos, "expected '\"' opening a column name"));
        }
        pos += 1;

        let name_len = text[pos..]
            .find("\"=")
            .ok_or_else(|| CoreError::malformed(pos, "unterminated column name"))?;
        let name = text[pos..pos + name_len].to_string();
        pos += name_len + 2;

        let value = match bytes.get(pos) {
            Some(b' ') => {
                pos += 1;
                None
            },
            Some(b'\'') => {
                let (value, next) = read_quoted(text, pos + 1)?;
                pos = next;
                Some(value)
            },
            _ => return Err(CoreError::malformed(pos, "expected ' ' or '\\'' after '='")),
        };

        columns.push(DecodedColumn { name, value });
    }

    Ok(columns)
}

/// Read an escaped value starting just after its opening quote.
///
/// Returns the unescaped value and the offset after the trailing space.
fn read_quoted(text: &str, start: usize) -> Result<(String, usize)> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut segment = start;
    let mut pos = start;

    loop {
        match bytes.get(pos) {
            None => return Err(CoreError::malformed(start, "unterminated quoted value")),
            Some(&b) if b == b'\'' || b == b'\\' => {
                if bytes.get(pos + 1) == Some(&b) {
                    // doubled: keep one copy
                    value.push_str(&text[segment..=pos]);
                    pos += 2;
                    segment = pos;
                } else if b == b'\'' {
                    value.push_str(&text[segment..pos]);
                    pos += 1;
                    break;
                } else {
                    return Err(CoreError::malformed(pos, "lone '\\' in quoted value"));
                }
            },
            Some(_) => pos += 1,
        }
    }

    if bytes.get(pos) != Some(&b' ') {
        return Err(CoreError::malformed(pos, "expected ' ' after quoted value"));
    }

    Ok((value, pos + 1))
}

/// Parse a `<value>,'t'` / `<value>,'f'` sequence payload.
///
/// # Errors
/// `CoreError::MalformedPayload` for anything else.
pub fn decode_sequence(text: &str) -> Result<SequenceValue> {
    let (number, flag) = text
        .split_once(',')
        .ok_or_else(|| CoreError::malformed(0, "expected '<value>,<flag>'"))?;

    let value = number
        .parse::<i64>()
        .map_err(|e| CoreError::malformed(0, format!("invalid sequence value: {}", e)))?;

    let is_called = match flag {
        "'t'" => true,
        "'f'" => false,
        _ => {
            return Err(CoreError::malformed(
                number.len() + 1,
                "expected 't' or 'f' flag",
            ))
        },
    };

    Ok(SequenceValue { value, is_called })
}
