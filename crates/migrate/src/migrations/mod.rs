//! Migration System
//!
//! Discovery and creation of migration files, the control table, and the
//! runner that applies pending migrations.

pub mod definitions;
pub mod lock;
pub mod manager;
pub mod runner;
pub mod state;

pub use definitions::*;
pub use lock::{AdvisoryLock, RunLock};
pub use manager::MigrationManager;
pub use runner::MigrationRunner;
pub use state::StateStore;
