//! Error types for the migration engine
//!
//! Every fallible operation returns a [`MigrateError`]. Nothing in this crate
//! terminates the process or logs in place of returning an error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration discovery, execution and creation
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The database could not be reached or refused the connection
    #[error("Failed to connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// The migration directory is missing, not a directory, or unreadable
    #[error("Migration directory '{}' is not readable: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A discovered migration file could not be read
    #[error("Failed to read migration file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The migration's own statements failed; its transaction was rolled back
    #[error("Failed to execute migration {id}: {source}")]
    Execution {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Recording the migration as applied failed; its transaction was rolled back
    #[error("Failed to record migration {id}: {source}")]
    Bookkeeping {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Beginning or committing the migration's transaction failed
    #[error("Transaction error for migration {id}: {source}")]
    Transaction {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// A control table query failed
    #[error("Control table query failed during {operation}: {source}")]
    State {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The run lock could not be acquired or released
    #[error("Run lock error: {0}")]
    Lock(#[source] sqlx::Error),

    /// Invalid input to the migration creator
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A new migration file could not be written
    #[error("Failed to create migration file '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid migrator configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MigrateError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The id of the migration this error belongs to, if any
    pub fn migration_id(&self) -> Option<&str> {
        match self {
            Self::Execution { id, .. }
            | Self::Bookkeeping { id, .. }
            | Self::Transaction { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }

    /// True when the applied record was rejected by the control table's primary key,
    /// i.e. another run applied the same migration first.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Bookkeeping {
                source: sqlx::Error::Database(db_err),
                ..
            } => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
