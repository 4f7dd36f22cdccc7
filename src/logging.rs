// Logging setup: a console layer for the operator and an optional file
// layer for keeping a debug trail of a migration run.

use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::Config;
use crate::error::{MigrateError, Result};

pub const LOG_FILE_PREFIX: &str = "ptrac-migrate.log";

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `console_log_level` for the console layer. The returned guard must be
/// held until exit or buffered file lines are lost.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>> {
    let console_level = parse_level(&config.console_log_level)?;
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));
    let console = fmt::layer()
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let (file_layer, guard) = if config.save_logs_to_file {
        let file_level = parse_level(&config.file_log_level)?;
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(file_level);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| MigrateError::Config(format!("could not install logger: {}", e)))?;
    Ok(guard)
}

pub fn parse_level(raw: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(raw.trim())
        .map_err(|_| MigrateError::Config(format!("unknown log level '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names_case_insensitively() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level(" debug ").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn rejects_unknown_levels() {
        assert!(matches!(parse_level("chatty"), Err(MigrateError::Config(_))));
    }
}
