//! PostgreSQL backend
//!
//! `PgSession` wraps the connection of the caller's open transaction, so
//! every catalog read, sequence call and log insert happens inside it.
//!
//! Dynamic queries (sqlx::query) are used instead of the compile-time
//! checked macros so the crate builds without DATABASE_URL.
//!
//! ```rust,no_run
//! use dbmirror_log::{PgSession, PendingLogWriter};
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let mut tx = pool.begin().await?;
//! let mut session = PgSession::new(&mut *tx);
//! let xid = session.transaction_id().await?;
//! // ... capture, then
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{LogError, Result};
use crate::ports::{CatalogProvider, PendingLogWriter, SequencePort};
use crate::types::{HeaderId, NewHeader};
use async_trait::async_trait;
use dbmirror_core::{ColumnDef, Payload, TableRef, TableSchema};
use sqlx::PgConnection;
use tracing::debug;

/// Header table
pub const PENDING_TABLE: &str = "dbmirror_pending";

/// Payload table
pub const PENDING_DATA_TABLE: &str = "dbmirror_pendingdata";

/// Catalog and log access bound to one open transaction.
pub struct PgSession<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgSession<'c> {
    /// Bind a session to a connection (usually `&mut *tx`)
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    async fn relation_exists(&mut self, table: &TableRef) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM pg_class c
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE n.nspname = $1
                  AND c.relname = $2
                  AND c.relkind IN ('r', 'p')
            )
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl<'c> CatalogProvider for PgSession<'c> {
    async fn primary_key(&mut self, table: &TableRef) -> Result<Option<Vec<i16>>> {
        // no row: relation missing; NULL key: relation without a primary key
        let key: Option<Option<Vec<i16>>> = sqlx::query_scalar(
            r#"
            SELECT i.indkey::int2[]
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_index i ON i.indrelid = c.oid AND i.indisprimary
            WHERE n.nspname = $1
              AND c.relname = $2
              AND c.relkind IN ('r', 'p')
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_optional(&mut *self.conn)
        .await?;

        match key {
            None => Err(LogError::UnknownTable(table.to_string())),
            Some(key) => Ok(key.filter(|k| !k.is_empty())),
        }
    }

    async fn foreign_key_columns(&mut self, table: &TableRef) -> Result<Vec<i16>> {
        let columns: Vec<i16> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT k.attnum
            FROM pg_constraint con
            JOIN pg_class c ON c.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            CROSS JOIN LATERAL unnest(con.conkey) AS k(attnum)
            WHERE con.contype = 'f'
              AND n.nspname = $1
              AND c.relname = $2
            ORDER BY k.attnum
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(&mut *self.conn)
        .await?;

        if columns.is_empty() && !self.relation_exists(table).await? {
            return Err(LogError::UnknownTable(table.to_string()));
        }

        Ok(columns)
    }

    async fn table_schema(&mut self, table: &TableRef) -> Result<Option<TableSchema>> {
        let rows: Vec<(i16, String, bool)> = sqlx::query_as(
            r#"
            SELECT a.attnum, a.attname::text, a.attisdropped
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1
              AND c.relname = $2
              AND c.relkind IN ('r', 'p')
              AND a.attnum > 0
            ORDER BY a.attnum
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(&mut *self.conn)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .into_iter()
            .map(|(ordinal, name, dropped)| ColumnDef {
                ordinal,
                name,
                dropped,
            })
            .collect();

        Ok(Some(TableSchema {
            table: table.clone(),
            columns,
        }))
    }
}

#[async_trait]
impl<'c> PendingLogWriter for PgSession<'c> {
    async fn transaction_id(&mut self) -> Result<i64> {
        let xid: i64 = sqlx::query_scalar("SELECT txid_current()")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(xid)
    }

    async fn write_header(&mut self, header: &NewHeader) -> Result<HeaderId> {
        let seq_id: i64 = sqlx::query_scalar(
            "INSERT INTO dbmirror_pending (tablename, op, xid) VALUES ($1, $2, $3) RETURNING seqid",
        )
        .bind(&header.table_name)
        .bind(header.operation.as_str())
        .bind(header.xid)
        .fetch_one(&mut *self.conn)
        .await?;

        debug!(
            seq_id,
            table = %header.table_name,
            op = %header.operation,
            "Pending header stored"
        );

        Ok(HeaderId(seq_id))
    }

    async fn write_payload(
        &mut self,
        header: HeaderId,
        is_key: bool,
        payload: &Payload,
    ) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO dbmirror_pendingdata (seqid, iskey, data) VALUES ($1, $2, $3)",
        )
        .bind(header.as_i64())
        .bind(is_key)
        .bind(payload.as_str())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() != 1 {
            return Err(LogError::Database(format!(
                "pending data insert for header {} affected {} rows",
                header,
                result.rows_affected()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl<'c> SequencePort for PgSession<'c> {
    async fn set_value(&mut self, sequence: &TableRef, value: i64) -> Result<i64> {
        let result: i64 = sqlx::query_scalar("SELECT setval($1::text::regclass, $2)")
            .bind(sequence.quoted(true))
            .bind(value)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(result)
    }

    async fn set_value_with_called(
        &mut self,
        sequence: &TableRef,
        value: i64,
        is_called: bool,
    ) -> Result<i64> {
        let result: i64 = sqlx::query_scalar("SELECT setval($1::text::regclass, $2, $3)")
            .bind(sequence.quoted(true))
            .bind(value)
            .bind(is_called)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(result)
    }

    async fn next_value(&mut self, sequence: &TableRef) -> Result<i64> {
        let result: i64 = sqlx::query_scalar("SELECT nextval($1::text::regclass)")
            .bind(sequence.quoted(true))
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(result)
    }
}
