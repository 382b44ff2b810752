//! Run lock
//!
//! Serialises whole runs across migrator processes. The control table's
//! primary key still guards against double application without it.

use async_trait::async_trait;
use sqlx::AnyConnection;

use crate::error::{MigrateError, MigrateResult};

const POSTGRES_BACKEND: &str = "PostgreSQL";

/// Exclusive lock held on the run's connection from before the control table
/// is ensured until the run has finished.
#[async_trait]
pub trait RunLock: Send + Sync {
    async fn acquire(&self, conn: &mut AnyConnection) -> MigrateResult<()>;

    async fn release(&self, conn: &mut AnyConnection) -> MigrateResult<()>;
}

/// Session-level PostgreSQL advisory lock keyed by the control table name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisoryLock {
    key: i64,
}

impl AdvisoryLock {
    pub fn for_table(table: &str) -> Self {
        Self {
            key: lock_key(table),
        }
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    fn supported(conn: &AnyConnection) -> bool {
        conn.backend_name() == POSTGRES_BACKEND
    }
}

#[async_trait]
impl RunLock for AdvisoryLock {
    async fn acquire(&self, conn: &mut AnyConnection) -> MigrateResult<()> {
        if !Self::supported(conn) {
            tracing::warn!(
                backend = conn.backend_name(),
                "advisory locks are not supported by this backend, running without a lock"
            );
            return Ok(());
        }

        tracing::debug!(key = self.key, "waiting for migration lock");
        // pg_advisory_lock returns void, which the Any driver cannot decode
        sqlx::query("SELECT 1 FROM (SELECT pg_advisory_lock($1)) AS run_lock")
            .bind(self.key)
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Lock)?;
        tracing::debug!(key = self.key, "acquired migration lock");
        Ok(())
    }

    async fn release(&self, conn: &mut AnyConnection) -> MigrateResult<()> {
        if !Self::supported(conn) {
            return Ok(());
        }

        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(self.key)
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Lock)?;
        tracing::debug!(key = self.key, "released migration lock");
        Ok(())
    }
}

/// 64-bit FNV-1a of the table name
fn lock_key(table: &str) -> i64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = table.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    hash as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_is_stable_per_table() {
        assert_eq!(lock_key("migrations"), lock_key("migrations"));
        assert_ne!(lock_key("migrations"), lock_key("schema_migrations"));
        assert_eq!(
            AdvisoryLock::for_table("migrations").key(),
            lock_key("migrations")
        );
    }

    #[test]
    fn test_lock_key_matches_fnv1a() {
        // FNV-1a of the empty string is the offset basis
        assert_eq!(lock_key(""), 0xcbf2_9ce4_8422_2325_u64 as i64);
        assert_eq!(lock_key("a"), 0xaf63_dc4c_8601_ec8c_u64 as i64);
    }
}
