//! Error types for import operations

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of an [`ImportError`], printed by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid setting
    Configuration,
    /// Source directory missing or inaccessible
    Discovery,
    /// Table could not be created
    Schema,
    /// A row could not be inserted
    Data,
    /// A source file could not be read
    Io,
    /// Connection or transaction failure
    Transport,
    /// The run was cancelled
    Cancelled,
}

impl ErrorCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Discovery => "discovery error",
            ErrorCategory::Schema => "schema error",
            ErrorCategory::Data => "data error",
            ErrorCategory::Io => "io error",
            ErrorCategory::Transport => "transport error",
            ErrorCategory::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur during an import run
#[derive(Error, Debug)]
pub enum ImportError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Source directory could not be enumerated
    #[error("Cannot discover files in {path}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    /// Table creation failed
    #[error("Cannot create table '{table}' for {path}: {reason}")]
    Schema {
        path: PathBuf,
        table: String,
        reason: String,
    },

    /// Row insertion failed
    #[error("Cannot insert line {line} of {path} into '{table}': {reason}")]
    Data {
        path: PathBuf,
        table: String,
        line: usize,
        reason: String,
    },

    /// IO error with path context
    #[error("IO error with {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing generated output failed
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    /// Connection or transaction error
    #[error("Database error: {0}")]
    Transport(String),

    /// Cancelled through a cancellation token
    #[error("Import cancelled")]
    Cancelled,
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::Config(_) => ErrorCategory::Configuration,
            ImportError::Discovery { .. } => ErrorCategory::Discovery,
            ImportError::Schema { .. } => ErrorCategory::Schema,
            ImportError::Data { .. } => ErrorCategory::Data,
            ImportError::Io { .. } | ImportError::Output(_) => ErrorCategory::Io,
            ImportError::Transport(_) => ErrorCategory::Transport,
            ImportError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ImportError::Config(msg) => {
                format!("Invalid configuration: {msg}\n\nHint: Check your settings file.")
            }
            ImportError::Discovery { path, reason } => {
                format!(
                    "Cannot discover files in {}\nReason: {reason}\n\n\
                    Hint: Check that the source directory exists and is readable.",
                    path.display()
                )
            }
            ImportError::Schema {
                path,
                table,
                reason,
            } => {
                format!(
                    "Cannot create table '{table}' for {}\nReason: {reason}\n\n\
                    Hint: Table names must be unique and headers must not be empty. \
                    No changes were committed.",
                    path.display()
                )
            }
            ImportError::Data {
                path,
                table,
                line,
                reason,
            } => {
                format!(
                    "Cannot insert line {line} of {} into '{table}'\nReason: {reason}\n\n\
                    Hint: Every line must have as many fields as the header. \
                    No changes were committed.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

impl From<duckdb::Error> for ImportError {
    fn from(err: duckdb::Error) -> Self {
        ImportError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            ImportError::Config("x".to_string()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ImportError::Transport("x".to_string()).category(),
            ErrorCategory::Transport
        );
        assert_eq!(ImportError::Cancelled.category(), ErrorCategory::Cancelled);
        assert_eq!(ErrorCategory::Schema.to_string(), "schema error");
    }

    #[test]
    fn test_data_error_carries_context() {
        let err = ImportError::Data {
            path: PathBuf::from("data/sales.csv"),
            table: "sales".to_string(),
            line: 3,
            reason: "expected 2 fields, found 3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("data/sales.csv"));
        assert!(msg.contains("'sales'"));
        assert!(err.user_message().contains("No changes were committed"));
    }
}
