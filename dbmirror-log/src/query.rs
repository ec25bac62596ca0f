//! Pending log querying
//!
//! Read side for operators and tests. Consumers that apply and delete
//! entries live outside this crate.

use crate::error::{LogError, Result};
use crate::types::{PendingData, PendingEntry, PendingHeader};
use dbmirror_core::{CoreError, Operation, Payload};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;

/// Filters for reading pending entries
#[derive(Debug, Clone)]
pub struct PendingQuery {
    /// Only entries for this rendered table name
    pub table_name: Option<String>,

    /// Only entries with a larger sequence id
    pub after_seq_id: Option<i64>,

    /// Maximum number of headers returned
    pub limit: i64,
}

impl PendingQuery {
    /// Query the first `limit` entries
    pub fn new(limit: i64) -> Self {
        Self {
            table_name: None,
            after_seq_id: None,
            limit,
        }
    }

    /// Filter by rendered table name (e.g. `"public"."users"`)
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Resume after a sequence id
    pub fn after(mut self, seq_id: i64) -> Self {
        self.after_seq_id = Some(seq_id);
        self
    }
}

impl Default for PendingQuery {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Read pending entries in sequence id order.
pub async fn query_pending(pool: &PgPool, options: &PendingQuery) -> Result<Vec<PendingEntry>> {
    let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
        r#"
        SELECT seqid, tablename, op, xid
        FROM dbmirror_pending
        WHERE ($1::text IS NULL OR tablename = $1)
          AND ($2::bigint IS NULL OR seqid > $2)
        ORDER BY seqid
        LIMIT $3
        "#,
    )
    .bind(&options.table_name)
    .bind(options.after_seq_id)
    .bind(options.limit)
    .fetch_all(pool)
    .await?;

    let mut headers = Vec::with_capacity(rows.len());
    for (seq_id, table_name, op, xid) in rows {
        let operation = parse_op(seq_id, &op)?;
        headers.push(PendingHeader {
            seq_id,
            table_name,
            operation,
            xid,
        });
    }

    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = headers.iter().map(|h| h.seq_id).collect();
    let data_rows: Vec<(i64, bool, String)> = sqlx::query_as(
        r#"
        SELECT seqid, iskey, data
        FROM dbmirror_pendingdata
        WHERE seqid = ANY($1)
        ORDER BY seqid, iskey DESC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_header: HashMap<i64, Vec<PendingData>> = HashMap::new();
    for (seq_id, is_key, data) in data_rows {
        by_header.entry(seq_id).or_default().push(PendingData {
            seq_id,
            is_key,
            data: Payload::from_text(data),
        });
    }

    let entries = headers
        .into_iter()
        .map(|header| {
            let data = by_header.remove(&header.seq_id).unwrap_or_default();
            if data.is_empty() {
                warn!(seq_id = header.seq_id, "Pending header has no data rows");
            }
            PendingEntry { header, data }
        })
        .collect();

    Ok(entries)
}

fn parse_op(seq_id: i64, op: &str) -> Result<Operation> {
    let mut chars = op.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => {
            Operation::from_code(code).map_err(|source| LogError::Corrupt { seq_id, source })
        },
        _ => {
            let code = op.chars().next().unwrap_or(' ');
            Err(LogError::Corrupt {
                seq_id,
                source: CoreError::InvalidOperationCode(code),
            })
        },
    }
}
