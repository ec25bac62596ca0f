//! CLI configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{CtlError, CtlResult};
use std::env;
use std::fmt;

/// Default page size for `pending list`
pub const DEFAULT_PENDING_LIMIT: i64 = 100;

// =============================================================================
// Configuration
// =============================================================================

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string; only db and pending commands need it
    pub database_url: Option<String>,

    /// Environment (test, development, production)
    pub environment: Environment,

    /// Log output format
    pub log_format: LogFormat,

    /// Default number of headers shown by `pending list`
    pub pending_limit: i64,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> CtlResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            environment: Self::load_environment()?,
            log_format: Self::load_log_format()?,
            pending_limit: Self::load_pending_limit()?,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            database_url: None,
            environment: Environment::Test,
            log_format: LogFormat::Text,
            pending_limit: 10,
        }
    }

    /// Connection string, or an error naming the missing variable
    pub fn require_database_url(&self) -> CtlResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CtlError::Config("DATABASE_URL environment variable is required".to_string())
        })
    }

    fn load_environment() -> CtlResult<Environment> {
        let env_str = env::var("DBMIRROR_ENV").unwrap_or_else(|_| "development".to_string());
        Environment::parse(&env_str)
    }

    fn load_log_format() -> CtlResult<LogFormat> {
        let format_str = env::var("DBMIRROR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
        LogFormat::parse(&format_str)
    }

    fn load_pending_limit() -> CtlResult<i64> {
        match env::var("DBMIRROR_PENDING_LIMIT") {
            Ok(val) => parse_limit(&val).ok_or_else(|| {
                CtlError::Config(format!("Invalid DBMIRROR_PENDING_LIMIT: {}", val))
            }),
            Err(_) => Ok(DEFAULT_PENDING_LIMIT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            environment: Environment::Development,
            log_format: LogFormat::Text,
            pending_limit: DEFAULT_PENDING_LIMIT,
        }
    }
}

/// Parse a positive page size
pub(crate) fn parse_limit(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok().filter(|limit| *limit > 0)
}

impl Environment {
    fn parse(text: &str) -> CtlResult<Self> {
        match text.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(CtlError::Config(format!(
                "Invalid DBMIRROR_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }
}

impl LogFormat {
    fn parse(text: &str) -> CtlResult<Self> {
        match text.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(CtlError::Config(format!(
                "Invalid DBMIRROR_LOG_FORMAT: {}. Expected: text, json",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
