//! Test helpers for dbmirror capture tests.
//!
//! Provides catalog fixtures for the in-memory backend and schema setup for
//! database-backed tests.

mod helpers;

pub use helpers::{
    create_order_tables, create_people_table, memory_backend, no_key_table, order_lines_table,
    order_lines_topology, people_table, sequence_ref, ORDERS_DDL, ORDER_LINES_DDL, PEOPLE_DDL,
};

use anyhow::Result;
use sqlx::PgPool;

/// Setup a clean test database by running migrations.
///
/// Migrations are located at the workspace root.
pub async fn setup_test_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    Ok(())
}
