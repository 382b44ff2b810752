//! Logging setup for the CLI
//!
//! The library only emits `tracing` events; installing a subscriber is done
//! here, writing to stderr so reports on stdout stay clean.

use clap::ValueEnum;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration for the CLI
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn"), overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Filter directive applied when `RUST_LOG` is not set
    pub fn directive(&self) -> String {
        format!("warn,pgmigrate={level},pgmigrate_cli={level}", level = self.level)
    }
}

/// Initialize structured logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directive()))?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).with_target(false))
            .try_init()?,
    }

    tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_scopes_level_to_own_crates() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Text,
        };
        assert_eq!(
            config.directive(),
            "warn,pgmigrate=debug,pgmigrate_cli=debug"
        );
        assert!(EnvFilter::try_new(config.directive()).is_ok());
    }
}
