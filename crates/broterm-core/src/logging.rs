//! File-based logging initialization.
//!
//! The terminal belongs to the UI, so logs go to a daily-rotated file through
//! a non-blocking writer. The returned guard flushes on drop and must be held
//! by the binary until exit.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Environment variable holding a filter directive that overrides the config.
pub const LOG_ENV: &str = "BROTERM_LOG";

pub const LOG_FILE_PREFIX: &str = "broterm.log";

/// Builds the filter from `BROTERM_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    let dir = config.dir_or_default();
    init_in(&dir, &config.level)
}

fn init_in(dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!(dir = %dir.display(), %level, "logging initialized");
    Ok(guard)
}
