//! Subscriber setup for the command line tool.
//!
//! Library crates log through the `log` facade; `try_init` bridges those
//! records into the tracing subscriber installed here.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log files are named `hexo-sync.YYYY-MM-DD.log`
pub const LOG_FILE_PREFIX: &str = "hexo-sync";

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(debug_logging_enabled: bool) -> &'static str {
    if debug_logging_enabled { "debug" } else { "info" }
}

/// Install the global subscriber.
///
/// Human-readable output goes to stderr. With `log_dir`, the same records are
/// also appended to a daily-rotated file; keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn init(debug_logging_enabled: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(debug_logging_enabled)))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .with_context(|| format!("Cannot create log files in {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
