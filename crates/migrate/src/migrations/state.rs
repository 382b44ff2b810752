//! Control table access
//!
//! The control table holds one row per applied migration and is the only
//! record of what has run.

use sqlx::AnyConnection;
use std::collections::BTreeSet;

use crate::config::validate_table_name;
use crate::error::{MigrateError, MigrateResult};

/// Reads and writes the control table
#[derive(Debug, Clone)]
pub struct StateStore {
    table: String,
}

impl StateStore {
    /// Create a store for the given control table name
    pub fn new(table: impl Into<String>) -> MigrateResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the control table if it does not exist yet
    pub async fn ensure_table(&self, conn: &mut AnyConnection) -> MigrateResult<()> {
        let sql = self.create_table_sql();
        sqlx::query(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|source| MigrateError::State {
                operation: "ensure_table",
                source,
            })?;
        Ok(())
    }

    /// Check whether a migration has been recorded as applied.
    ///
    /// A missing row is `false`; any failure of the query itself is an error.
    pub async fn is_applied(&self, conn: &mut AnyConnection, id: &str) -> MigrateResult<bool> {
        let sql = self.check_migration_sql();
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|source| MigrateError::State {
                operation: "is_applied",
                source,
            })?;

        Ok(row.is_some())
    }

    /// Insert the applied record on the caller's transaction connection.
    ///
    /// Fails if the id is already present, which fails the whole transaction.
    pub async fn record_applied(&self, tx: &mut AnyConnection, id: &str) -> MigrateResult<()> {
        let sql = self.record_migration_sql();
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrateError::Bookkeeping {
                id: id.to_string(),
                source,
            })?;
        Ok(())
    }

    /// All applied migration ids
    pub async fn applied_ids(&self, conn: &mut AnyConnection) -> MigrateResult<BTreeSet<String>> {
        let sql = self.applied_migrations_sql();
        let ids: Vec<String> = sqlx::query_scalar(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|source| MigrateError::State {
                operation: "applied_ids",
                source,
            })?;

        Ok(ids.into_iter().collect())
    }

    /// SQL to create the migrations tracking table
    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id VARCHAR PRIMARY KEY)",
            self.table
        )
    }

    /// SQL to check if a migration has been applied
    fn check_migration_sql(&self) -> String {
        format!("SELECT id FROM {} WHERE id = $1", self.table)
    }

    /// SQL to record a migration as applied
    fn record_migration_sql(&self) -> String {
        format!("INSERT INTO {} (id) VALUES ($1)", self.table)
    }

    /// SQL to get applied migrations
    fn applied_migrations_sql(&self) -> String {
        format!("SELECT id FROM {} ORDER BY id", self.table)
    }
}
