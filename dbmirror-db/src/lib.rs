//! Database lifecycle management for dbmirror.
//!
//! Provides migration running and status checking for the pending log tables.

use dbmirror_log::{PENDING_DATA_TABLE, PENDING_TABLE};
use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Row counts of the pending log tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCounts {
    /// Rows in `dbmirror_pending`
    pub headers: i64,
    /// Rows in `dbmirror_pendingdata`
    pub data: i64,
}

/// Run all pending migrations.
///
/// Uses sqlx migrations from the workspace `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Count rows waiting in the pending log.
pub async fn pending_counts(pool: &PgPool) -> Result<PendingCounts> {
    let headers: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", PENDING_TABLE))
        .fetch_one(pool)
        .await?;
    let data: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", PENDING_DATA_TABLE))
        .fetch_one(pool)
        .await?;

    Ok(PendingCounts { headers, data })
}

/// Check database connectivity, migration status and backlog size.
pub async fn status(pool: &PgPool) -> Result<()> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    // runtime query: sqlx::query! would need a database at compile time
    let rows = sqlx::query(
        r#"
        SELECT version, description, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(migs) if !migs.is_empty() => {
            info!("Latest migrations:");
            for mig in migs {
                let version: i64 = mig.get("version");
                let description: String = mig.get("description");
                let success: bool = mig.get("success");

                let status = if success { "ok" } else { "FAILED" };
                info!("  [{}] v{}: {}", status, version, description);
            }
        },
        Ok(_) => {
            warn!("No migrations found in database (run `dbmirrorctl db migrate` first)");
            return Ok(());
        },
        Err(e) => {
            // table is missing until the first migrate
            if e.to_string().contains("_sqlx_migrations") {
                warn!("Migration table not found (run `dbmirrorctl db migrate` first)");
                return Ok(());
            }
            return Err(e.into());
        },
    }

    let counts = pending_counts(pool).await?;
    info!(
        headers = counts.headers,
        data_rows = counts.data,
        "Pending log backlog"
    );

    Ok(())
}
