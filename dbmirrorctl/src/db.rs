//! Database CLI subcommands for dbmirrorctl.
//!
//! Provides `db migrate` and `db status` commands.

use anyhow::{anyhow, Result};
use tracing::info;

use crate::config::Config;
use dbmirror_db::{migrate, pending_counts, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `dbmirrorctl db migrate` - Create or update the pending log tables
/// - `dbmirrorctl db status` - Check migrations and backlog
pub async fn run_db_command(args: Vec<String>, config: &Config) -> Result<()> {
    if args.len() < 3 {
        return Err(anyhow!("Usage: dbmirrorctl db <migrate|status>"));
    }

    let pool = sqlx::PgPool::connect(config.require_database_url()?).await?;

    match args[2].as_str() {
        "migrate" => {
            migrate(&pool).await?;
            let counts = pending_counts(&pool).await?;
            info!(headers = counts.headers, data = counts.data, "Pending log ready");
        },
        "status" => {
            status(&pool).await?;
        },
        _ => {
            return Err(anyhow!("Unknown db command: {}. Use migrate or status", args[2]));
        },
    }

    Ok(())
}
