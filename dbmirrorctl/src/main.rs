//! dbmirror operator CLI
//!
//! # Usage
//!
//! ```bash
//! # Create the pending log tables
//! DATABASE_URL=postgres://localhost/app dbmirrorctl db migrate
//!
//! # Inspect the backlog as JSON
//! DBMIRROR_LOG_FORMAT=json dbmirrorctl pending list --limit 20
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `DBMIRROR_ENV`: Environment (test, development, production)
//! - `DBMIRROR_LOG_FORMAT`: Log and output format (text, json)
//! - `DBMIRROR_PENDING_LIMIT`: Default page size for `pending list` (default: 100)

use anyhow::anyhow;
use dbmirrorctl::{run_db_command, run_pending_command, Config, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "Usage: dbmirrorctl <db|pending> <command> [options]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("dbmirrorctl=info".parse()?);
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "dbmirrorctl"
    );

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("db") => run_db_command(args, &config).await,
        Some("pending") => run_pending_command(args, &config).await,
        Some(other) => Err(anyhow!("Unknown command: {}. {}", other, USAGE)),
        None => Err(anyhow!(USAGE)),
    }
}
