//! Per-trigger capture options.

use dbmirror_core::ColumnUsage;

/// Trigger argument that switches on verbose key images
pub const VERBOSE_ARG: &str = "verbose";

/// How one trigger registration captures changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Key images carry foreign-key columns as well as the primary key
    pub verbose: bool,
    /// Render table names as `"schema"."table"` rather than `"table"`
    pub qualify_schema: bool,
}

impl CaptureOptions {
    /// Build options from the trigger's argument list.
    ///
    /// Verbose is on only when the first argument is exactly `verbose`.
    pub fn from_trigger_args<S: AsRef<str>>(args: &[S]) -> Self {
        let verbose = args
            .first()
            .map(|arg| arg.as_ref() == VERBOSE_ARG)
            .unwrap_or(false);

        Self {
            verbose,
            ..Self::default()
        }
    }

    /// Set verbose key images
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set schema qualification of table names
    pub fn with_qualified_names(mut self, qualify_schema: bool) -> Self {
        self.qualify_schema = qualify_schema;
        self
    }

    /// Policy for the key image of deletes and updates
    pub fn key_usage(&self) -> ColumnUsage {
        if self.verbose {
            ColumnUsage::KeyAndForeignColumns
        } else {
            ColumnUsage::KeysOnly
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            qualify_schema: true,
        }
    }
}
