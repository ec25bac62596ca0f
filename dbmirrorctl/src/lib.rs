//! dbmirror operator CLI
//!
//! Maintenance commands for the pending log tables:
//!
//! - `db migrate` / `db status`: schema management
//! - `pending list`: inspect entries waiting for the mirror consumer
//!
//! # Example
//!
//! ```rust,ignore
//! use dbmirrorctl::{Config, run_pending_command};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let args: Vec<String> = vec!["dbmirrorctl".into(), "pending".into(), "list".into()];
//!     run_pending_command(args, &config).await.expect("pending list failed");
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod db;
pub mod error;
pub mod pending;

pub use config::{Config, Environment, LogFormat};
pub use db::run_db_command;
pub use error::{CtlError, CtlResult};
pub use pending::{run_pending_command, ListArgs};
