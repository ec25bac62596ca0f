//! Fixture tables and seeding helpers.

use dbmirror_core::{KeyTopology, TableRef, TableSchema};
use dbmirror_log::MemoryBackend;
use sqlx::PgPool;

use crate::Result;

/// `public.t (id PK, name)`
pub const PEOPLE_DDL: &str = "CREATE TABLE t (id INT PRIMARY KEY, name TEXT)";

/// Parent of `order_lines`
pub const ORDERS_DDL: &str = "CREATE TABLE orders (id INT PRIMARY KEY, note TEXT)";

/// `order_lines` with a composite key in (line, order_id) order, a foreign
/// key on `order_id` and a dropped column
pub const ORDER_LINES_DDL: &str = r#"
    CREATE TABLE order_lines (
        order_id INT NOT NULL REFERENCES orders(id),
        line INT NOT NULL,
        sku TEXT,
        legacy TEXT,
        qty INT,
        PRIMARY KEY (line, order_id)
    );
    ALTER TABLE order_lines DROP COLUMN legacy;
"#;

/// Layout of `public.t`
pub fn people_table() -> TableSchema {
    TableSchema::new(TableRef::new("public", "t"))
        .with_column("id")
        .with_column("name")
}

/// Layout of `public.order_lines`, slot 4 dropped
pub fn order_lines_table() -> TableSchema {
    TableSchema::new(TableRef::new("public", "order_lines"))
        .with_column("order_id")
        .with_column("line")
        .with_column("sku")
        .with_dropped_column("legacy")
        .with_column("qty")
}

/// Primary key (line, order_id), foreign key on order_id
pub fn order_lines_topology() -> KeyTopology {
    KeyTopology::new(vec![2, 1], [1])
}

/// Layout of `public.audit`, which has no primary key
pub fn no_key_table() -> TableSchema {
    TableSchema::new(TableRef::new("public", "audit"))
        .with_column("at")
        .with_column("msg")
}

/// Sequence `public.s`
pub fn sequence_ref() -> TableRef {
    TableRef::new("public", "s")
}

/// In-memory backend with every fixture registered; `s` starts at 1.
pub fn memory_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.register_table(people_table(), KeyTopology::new(vec![1], []));
    backend.register_table(order_lines_table(), order_lines_topology());
    backend.register_table(no_key_table(), KeyTopology::default());
    backend.register_sequence(sequence_ref(), 1);
    backend
}

/// Create `public.t`.
pub async fn create_people_table(pool: &PgPool) -> Result<()> {
    sqlx::query(PEOPLE_DDL).execute(pool).await?;
    Ok(())
}

/// Create `orders` and `order_lines`.
pub async fn create_order_tables(pool: &PgPool) -> Result<()> {
    sqlx::query(ORDERS_DDL).execute(pool).await?;
    // multi-statement DDL needs the simple query protocol
    sqlx::raw_sql(ORDER_LINES_DDL).execute(pool).await?;
    Ok(())
}
