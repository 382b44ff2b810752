//! # pgmigrate: ordered, exactly-once SQL migrations
//!
//! Applies the SQL files found under a migrations directory to a database,
//! each inside its own transaction together with a row in a control table,
//! so that re-running is always safe. Files are applied in lexical order of
//! their path relative to the migrations directory; new files are named with
//! a leading nanosecond timestamp so that this order is creation order.
//!
//! ```no_run
//! use pgmigrate::{MigrationReport, MigrationRunner, MigratorConfig};
//!
//! # async fn run() -> Result<(), pgmigrate::MigrateError> {
//! let config = MigratorConfig::new("postgres://localhost/app");
//! let runner = MigrationRunner::connect(config).await?;
//!
//! let mut report = MigrationReport::new();
//! let result = runner.run_migrations(&mut report).await;
//! print!("{}", report);
//! result?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod migrations;
pub mod report;

pub use config::{ConfigError, MigratorConfig};
pub use error::{MigrateError, MigrateResult};
pub use migrations::*;
pub use report::{render_status, MigrationReport, Reporter};
