//! Migration Manager - File system operations for migrations
//!
//! Discovers migration files under the migrations directory and creates new,
//! timestamp-named migration files.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path};
use walkdir::WalkDir;

use super::definitions::MigrationFile;
use crate::config::{validate_extension, MigratorConfig};
use crate::error::{MigrateError, MigrateResult};

/// Migration manager for discovering and creating migrations
#[derive(Debug, Clone)]
pub struct MigrationManager {
    config: MigratorConfig,
}

impl MigrationManager {
    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigratorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// List every file below the migrations directory, ordered by id.
    ///
    /// The walk is recursive and keeps any entry that is not a directory.
    /// Walk order is not relied upon; the result is sorted explicitly.
    pub fn discover(&self) -> MigrateResult<Vec<MigrationFile>> {
        let root = &self.config.migrations_dir;

        let metadata = fs::metadata(root).map_err(|source| MigrateError::Directory {
            path: root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(MigrateError::Directory {
                path: root.clone(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                MigrateError::Directory {
                    path,
                    source: io::Error::from(err),
                }
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.into_path();
            let id = migration_id(root, &path);
            tracing::debug!(id = %id, path = %path.display(), "discovered migration file");
            files.push(MigrationFile { id, path });
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    /// Create a new, empty migration file and return its file name.
    ///
    /// The name has the form `<RFC 3339 UTC timestamp with nanoseconds>_<slug>.<ext>`.
    /// An existing file with the same name is never overwritten.
    pub fn create_migration(&self, name: &str) -> MigrateResult<String> {
        let slug = slugify(name)?;
        validate_extension(&self.config.extension)?;
        let dir = &self.config.migrations_dir;

        fs::create_dir_all(dir).map_err(|source| MigrateError::Create {
            path: dir.clone(),
            source,
        })?;

        let filename = migration_filename(Utc::now(), &slug, &self.config.extension);
        let filepath = dir.join(&filename);

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&filepath)
            .map_err(|source| MigrateError::Create {
                path: filepath.clone(),
                source,
            })?;

        tracing::info!(file = %filename, dir = %dir.display(), "created migration");
        Ok(filename)
    }
}

/// Id of a migration: its path relative to the migrations directory, `/`-separated
fn migration_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn migration_filename(now: DateTime<Utc>, slug: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        now.to_rfc3339_opts(SecondsFormat::Nanos, true),
        slug,
        extension
    )
}

fn slugify(name: &str) -> MigrateResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MigrateError::validation("missing migration name"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(MigrateError::validation(format!(
            "migration name '{}' must not contain path separators",
            trimmed
        )));
    }

    Ok(trimmed.split_whitespace().collect::<Vec<_>>().join("_"))
}
