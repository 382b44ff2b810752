//! Migration Runner - Executes migrations against the database
//!
//! Walks the discovered migrations in id order, skips the ones already in the
//! control table and applies each remaining one in its own transaction. The
//! first failure rolls back that migration and ends the run, so the control
//! table always holds a contiguous prefix of the ordered migration list.

use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Connection, Executor};
use std::time::Instant;

use super::definitions::{Migration, MigrationRunResult, MigrationState, Outcome, OutcomeStatus};
use super::lock::{AdvisoryLock, RunLock};
use super::manager::MigrationManager;
use super::state::StateStore;
use crate::config::MigratorConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::report::Reporter;

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    manager: MigrationManager,
    store: StateStore,
    pool: AnyPool,
    lock: Option<Box<dyn RunLock>>,
}

impl MigrationRunner {
    /// Create a new migration runner on an existing pool
    pub fn new(config: MigratorConfig, pool: AnyPool) -> MigrateResult<Self> {
        config.validate()?;

        let store = StateStore::new(config.migrations_table.clone())?;
        let lock = config.lock.then(|| {
            Box::new(AdvisoryLock::for_table(&config.migrations_table)) as Box<dyn RunLock>
        });

        Ok(Self {
            manager: MigrationManager::with_config(config),
            store,
            pool,
            lock,
        })
    }

    /// Connect to the configured database and create a runner.
    ///
    /// A run only ever uses one connection, so the pool is sized accordingly.
    pub async fn connect(config: MigratorConfig) -> MigrateResult<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        tracing::debug!(url = %config.redacted_url(), "connecting to database");
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&config.database_url)
            .await
            .map_err(MigrateError::Connection)?;

        Self::new(config, pool)
    }

    /// Replace the run lock, e.g. with a different locking strategy
    pub fn with_lock(mut self, lock: impl RunLock + 'static) -> Self {
        self.lock = Some(Box::new(lock));
        self
    }

    /// Get the database pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    /// Get the control table store
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run all pending migrations, reporting every outcome as it happens.
    ///
    /// On failure the reporter has already received the outcomes of every
    /// migration processed so far, ending with the failed one.
    pub async fn run_migrations(
        &self,
        reporter: &mut dyn Reporter,
    ) -> MigrateResult<MigrationRunResult> {
        let start_time = Instant::now();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(MigrateError::Connection)?;

        if let Some(lock) = &self.lock {
            lock.acquire(&mut conn).await?;
        }

        let result = self.run_pending(&mut conn, reporter, start_time).await;

        if let Some(lock) = &self.lock {
            if let Err(err) = lock.release(&mut conn).await {
                if result.is_ok() {
                    return Err(err);
                }
                tracing::warn!(error = %err, "failed to release migration lock");
            }
        }

        result
    }

    async fn run_pending(
        &self,
        conn: &mut AnyConnection,
        reporter: &mut dyn Reporter,
        start_time: Instant,
    ) -> MigrateResult<MigrationRunResult> {
        self.store.ensure_table(conn).await?;
        let files = self.manager.discover()?;

        let mut result = MigrationRunResult::default();
        for file in &files {
            if self.store.is_applied(conn, &file.id).await? {
                tracing::debug!(id = %file.id, "migration already applied");
                reporter.record(Outcome::new(&file.id, OutcomeStatus::AlreadyApplied));
                result.skipped_count += 1;
                continue;
            }

            let migration = file.load()?;
            if let Err(err) = self.apply(conn, &migration).await {
                reporter.record(Outcome::new(&migration.id, OutcomeStatus::Failed));
                return Err(err);
            }

            reporter.record(Outcome::new(&migration.id, OutcomeStatus::AppliedNow));
            result.applied_migrations.push(migration.id);
        }

        result.applied_count = result.applied_migrations.len();
        result.execution_time_ms = start_time.elapsed().as_millis();

        tracing::info!(
            table = %self.store.table(),
            applied = result.applied_count,
            skipped = result.skipped_count,
            elapsed_ms = result.execution_time_ms as u64,
            "migration run finished"
        );
        Ok(result)
    }

    /// Apply a single migration: its SQL and its applied record commit together or not at all.
    ///
    /// Does not consult the control table first; if the migration was already
    /// recorded the insert violates the primary key and everything is rolled back.
    pub async fn apply(&self, conn: &mut AnyConnection, migration: &Migration) -> MigrateResult<()> {
        tracing::info!(id = %migration.id, "applying migration");

        let mut transaction = conn
            .begin()
            .await
            .map_err(|source| MigrateError::Transaction {
                id: migration.id.clone(),
                source,
            })?;

        if !migration.is_empty() {
            // Executed unprepared so the file may hold several statements
            let executed = (&mut *transaction)
                .execute(migration.content.as_str())
                .await;
            if let Err(source) = executed {
                rollback(transaction, &migration.id).await;
                return Err(MigrateError::Execution {
                    id: migration.id.clone(),
                    source,
                });
            }
        }

        let recorded = self
            .store
            .record_applied(&mut transaction, &migration.id)
            .await;
        if let Err(err) = recorded {
            rollback(transaction, &migration.id).await;
            return Err(err);
        }

        transaction
            .commit()
            .await
            .map_err(|source| MigrateError::Transaction {
                id: migration.id.clone(),
                source,
            })?;

        tracing::info!(id = %migration.id, "applied migration");
        Ok(())
    }

    /// Get migration status for all migrations (applied and pending)
    pub async fn migration_status(&self) -> MigrateResult<Vec<MigrationState>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(MigrateError::Connection)?;

        self.store.ensure_table(&mut conn).await?;
        let files = self.manager.discover()?;
        let applied_ids = self.store.applied_ids(&mut conn).await?;

        Ok(files
            .into_iter()
            .map(|file| MigrationState {
                applied: applied_ids.contains(&file.id),
                id: file.id,
            })
            .collect())
    }
}

async fn rollback(transaction: sqlx::Transaction<'_, sqlx::Any>, id: &str) {
    if let Err(err) = transaction.rollback().await {
        // The connection discards the transaction when it is returned to the pool
        tracing::warn!(id = %id, error = %err, "failed to roll back migration transaction");
    }
}
