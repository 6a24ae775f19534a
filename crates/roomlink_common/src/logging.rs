//! Logging utilities for Roomlink.
//!
//! All crates log through `tracing`; the backend installs the subscriber once
//! at start-up via [`init_from_config`].

use roomlink_config::LoggingConfig;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// File name prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "roomlink.log";

/// Initialize the tracing subscriber at INFO, stdout only.
pub fn init() {
    init_with_level(Level::INFO, None);
}

/// Initialize the tracing subscriber from the `logging` config section.
///
/// An unparsable level falls back to INFO.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let guard = init_with_level(level, config.directory.as_deref());
    if Level::from_str(&config.level).is_err() {
        warn!("Unknown log level '{}', using {}", config.level, level);
    }
    guard
}

/// Initialize the tracing subscriber with a specific log level.
///
/// When `directory` is set, a daily rolling file layer is added next to the
/// stdout layer. The returned guard flushes the file writer on drop and must be
/// held for the lifetime of the process.
pub fn init_with_level(level: Level, directory: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("roomlink={}", level)
            .parse()
            .unwrap_or_else(|_| LevelFilter::from_level(level).into()),
    );

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true);

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // try_init: a subscriber may already be installed (tests, embedding)
    let result = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
        if let Some(dir) = directory {
            info!("Writing rolling log files to {}", dir);
        }
    }

    guard
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => tracing::error!("{}: {}", error_context, e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_result_passes_through() {
        let ok: Result<u32, String> = Ok(3);
        assert_eq!(log_result(ok, "fine", "failed"), Ok(3));

        let err: Result<u32, String> = Err("nope".to_string());
        assert_eq!(log_result(err, "fine", "failed"), Err("nope".to_string()));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
