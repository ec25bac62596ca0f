//! `pending list` subcommand.
//!
//! Prints pending entries with their payloads decoded. Read-only; the
//! mirror consumer owns deletion.

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;

use crate::config::{parse_limit, Config, LogFormat};
use crate::error::{CtlError, CtlResult};
use dbmirror_core::{decode_payload, decode_sequence, DecodedColumn, Operation, SequenceValue};
use dbmirror_log::{query_pending, PendingData, PendingEntry, PendingQuery};

// =============================================================================
// Arguments
// =============================================================================

/// Parsed `pending list` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// `--table "schema"."name"`
    pub table: Option<String>,
    /// `--after <seqid>`
    pub after: Option<i64>,
    /// `--limit <n>`
    pub limit: i64,
}

impl ListArgs {
    /// Parse the options following `pending list`.
    pub fn parse(args: &[String], default_limit: i64) -> CtlResult<Self> {
        let mut parsed = Self {
            table: None,
            after: None,
            limit: default_limit,
        };

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .ok_or_else(|| CtlError::Usage(format!("{} requires a value", flag)))
            };

            match flag.as_str() {
                "--table" => parsed.table = Some(value()?.clone()),
                "--after" => {
                    let text = value()?;
                    parsed.after = Some(
                        text.parse()
                            .map_err(|_| CtlError::Usage(format!("Invalid --after: {}", text)))?,
                    );
                },
                "--limit" => {
                    let text = value()?;
                    parsed.limit = parse_limit(text)
                        .ok_or_else(|| CtlError::Usage(format!("Invalid --limit: {}", text)))?;
                },
                other => return Err(CtlError::Usage(format!("Unknown option: {}", other))),
            }
        }

        Ok(parsed)
    }

    /// Query for these options
    pub fn query(&self) -> PendingQuery {
        let mut query = PendingQuery::new(self.limit);
        if let Some(table) = &self.table {
            query = query.table(table.clone());
        }
        if let Some(after) = self.after {
            query = query.after(after);
        }
        query
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// One payload row, decoded for display.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum DecodedData {
    Row(Vec<DecodedColumn>),
    Sequence(SequenceValue),
    Raw(String),
}

#[derive(Debug, Serialize)]
struct EntryView<'a> {
    seq_id: i64,
    table: &'a str,
    op: String,
    xid: i64,
    key: Option<DecodedData>,
    row: Option<DecodedData>,
}

fn decode(operation: Operation, data: &PendingData) -> DecodedData {
    let text = data.data.as_str();
    let decoded = if operation == Operation::SequenceAdvance {
        decode_sequence(text).map(DecodedData::Sequence)
    } else {
        decode_payload(text).map(DecodedData::Row)
    };
    // show undecodable payloads as stored
    decoded.unwrap_or_else(|_| DecodedData::Raw(text.to_string()))
}

fn view(entry: &PendingEntry) -> EntryView<'_> {
    let operation = entry.header.operation;
    EntryView {
        seq_id: entry.header.seq_id,
        table: &entry.header.table_name,
        op: operation.to_string(),
        xid: entry.header.xid,
        key: entry.key_data().map(|d| decode(operation, d)),
        row: entry.row_data().map(|d| decode(operation, d)),
    }
}

fn render_data(data: &DecodedData) -> String {
    match data {
        DecodedData::Row(columns) => columns
            .iter()
            .map(|c| match &c.value {
                Some(value) => format!("{}={:?}", c.name, value),
                None => format!("{}=NULL", c.name),
            })
            .collect::<Vec<_>>()
            .join(", "),
        DecodedData::Sequence(seq) => format!("value={} is_called={}", seq.value, seq.is_called),
        DecodedData::Raw(text) => format!("raw {:?}", text),
    }
}

/// Render one entry as a text block.
pub fn render_text(entry: &PendingEntry) -> String {
    let view = view(entry);
    let mut out = format!(
        "#{} {} {} (xid {})",
        view.seq_id, view.op, view.table, view.xid
    );
    if let Some(key) = &view.key {
        out.push_str(&format!("\n  key: {}", render_data(key)));
    }
    if let Some(row) = &view.row {
        out.push_str(&format!("\n  row: {}", render_data(row)));
    }
    out
}

/// Render one entry as a JSON line.
pub fn render_json(entry: &PendingEntry) -> Result<String> {
    Ok(serde_json::to_string(&view(entry))?)
}

// =============================================================================
// Command
// =============================================================================

/// Run pending CLI subcommands.
///
/// Supported commands:
/// - `dbmirrorctl pending list [--table NAME] [--after SEQID] [--limit N]`
pub async fn run_pending_command(args: Vec<String>, config: &Config) -> Result<()> {
    match args.get(2).map(String::as_str) {
        Some("list") => {},
        Some(other) => return Err(anyhow!("Unknown pending command: {}. Use list", other)),
        None => {
            return Err(anyhow!(
                "Usage: dbmirrorctl pending list [--table NAME] [--after SEQID] [--limit N]"
            ))
        },
    }

    let list = ListArgs::parse(&args[3..], config.pending_limit)?;
    let pool = sqlx::PgPool::connect(config.require_database_url()?).await?;

    let entries = query_pending(&pool, &list.query()).await?;
    info!(count = entries.len(), table = ?list.table, "Pending entries");

    for entry in &entries {
        match config.log_format {
            LogFormat::Json => println!("{}", render_json(entry)?),
            LogFormat::Text => println!("{}", render_text(entry)),
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
