//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system including
//! MigrationFile, Migration, Outcome and MigrationRunResult.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, MigrateResult};

/// A migration file found in the migrations directory, not yet read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path relative to the migrations directory, `/`-separated
    pub id: String,
    /// Full path of the file on disk
    pub path: PathBuf,
}

impl MigrationFile {
    /// Read the file fully into memory
    pub fn load(&self) -> MigrateResult<Migration> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            MigrateError::FileRead {
                path: self.path.clone(),
                source,
            }
        })?;

        Ok(Migration {
            id: self.id.clone(),
            path: self.path.clone(),
            content,
        })
    }
}

/// Represents a database migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Unique, lexically ordered identifier derived from the file name
    pub id: String,
    /// Where the migration was read from
    pub path: PathBuf,
    /// SQL statements executed as a single batch
    pub content: String,
}

impl Migration {
    /// Build a migration directly from SQL text
    pub fn new(id: impl Into<String>, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.as_ref().to_path_buf(),
            content: content.into(),
        }
    }

    /// True when there is nothing to execute besides recording the migration
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// What happened to a single migration during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Found in the control table, skipped
    AlreadyApplied,
    /// Applied and committed during this run
    AppliedNow,
    /// Rolled back; the run stopped here
    Failed,
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::AlreadyApplied => "already applied",
            OutcomeStatus::AppliedNow => "applied now",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one migration, reported in the order migrations were processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub id: String,
    pub status: OutcomeStatus,
}

impl Outcome {
    pub fn new(id: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

/// Result of running migrations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// IDs of migrations that were applied
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Applied/pending state of a discovered migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub id: String,
    pub applied: bool,
}

impl MigrationState {
    pub fn label(&self) -> &'static str {
        if self.applied {
            "applied"
        } else {
            "pending"
        }
    }
}
