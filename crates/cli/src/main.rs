mod commands;
mod logging;

use clap::{Parser, Subcommand};
use pgmigrate::config::{DEFAULT_DIR, DEFAULT_EXTENSION, DEFAULT_TABLE};
use pgmigrate::MigratorConfig;
use std::path::PathBuf;

use commands::migrate;
use logging::{LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(name = "pgmigrate")]
#[command(about = "Apply timestamped SQL migrations exactly once, in order")]
#[command(version)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Control table recording applied migrations
    #[arg(long, env = "MIGRATIONS_TABLE", default_value = DEFAULT_TABLE, global = true)]
    table: String,

    /// Directory holding the migration files
    #[arg(long, env = "MIGRATIONS_DIR", default_value = DEFAULT_DIR, global = true)]
    dir: PathBuf,

    /// Extension for files created with `create`
    #[arg(long, env = "MIGRATIONS_EXT", default_value = DEFAULT_EXTENSION, global = true)]
    ext: String,

    /// Hold an advisory lock for the whole run (PostgreSQL)
    #[arg(long, env = "MIGRATIONS_LOCK", global = true)]
    lock: bool,

    /// Log level for pgmigrate output, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run pending migrations
    Up,

    /// Create a new, empty migration
    Create {
        /// Migration name
        name: String,
    },

    /// Show applied and pending migrations
    Status,
}

impl Cli {
    fn config(&self) -> MigratorConfig {
        MigratorConfig::new(self.database_url.clone().unwrap_or_default())
            .with_table(self.table.clone())
            .with_dir(self.dir.clone())
            .with_extension(self.ext.clone())
            .with_lock(self.lock)
    }

    fn database_config(&self) -> anyhow::Result<MigratorConfig> {
        if self.database_url.is_none() {
            anyhow::bail!("missing database URL: pass --database-url or set DATABASE_URL");
        }
        Ok(self.config())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
    })?;

    match &cli.command {
        Commands::Up => {
            migrate::up(cli.database_config()?).await?;
        }
        Commands::Create { name } => {
            migrate::create(cli.config(), name)?;
        }
        Commands::Status => {
            migrate::status(cli.database_config()?).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_with_options() {
        let cli = Cli::try_parse_from([
            "pgmigrate",
            "--dir",
            "db/migrations",
            "--ext",
            "sql",
            "create",
            "add_users",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(config.extension, "sql");
        assert!(matches!(cli.command, Commands::Create { ref name } if name == "add_users"));
    }

    #[test]
    fn test_up_requires_database_url() {
        let mut cli = Cli::try_parse_from(["pgmigrate", "up"]).unwrap();

        cli.database_url = None;
        let err = cli.database_config().unwrap_err();
        assert!(err.to_string().contains("missing database URL"));

        cli.database_url = Some("postgres://localhost/app".to_string());
        let config = cli.database_config().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/app");
    }

    #[test]
    fn test_create_writes_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = MigratorConfig::new("").with_dir(temp_dir.path().to_path_buf());

        migrate::create(config, "init").unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("_init.pgsql"));
    }
}
