//! Logging setup.
//!
//! This module provides:
//! - Console output with local timezone timestamps (text or JSON)
//! - Optional daily-rotated log files under a configured directory
//! - Level validation for the `--log-level` flag

use std::path::PathBuf;

use chrono::Local;
use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "release_watch=info,github_releases=info";

/// File name prefix for rotated log files.
const LOG_FILE_PREFIX: &str = "release-watch.log";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Options for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub level: String,
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            dir: None,
        }
    }
}

/// Build the filter directive for a `--log-level` value.
///
/// `info` maps to [`DEFAULT_LOG_FILTER`]; other levels apply to both crates.
pub fn filter_directive(level: &str) -> crate::Result<String> {
    let level = level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(crate::Error::config(format!(
            "invalid log level '{}', expected one of: {}",
            level,
            LOG_LEVELS.join(", ")
        )));
    }

    if level == "info" {
        return Ok(DEFAULT_LOG_FILTER.to_string());
    }
    Ok(format!("release_watch={level},github_releases={level}"))
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `options.level`. When a log directory is
/// configured, the returned guard must be kept alive for the app lifetime.
pub fn init_logging(options: &LoggingOptions) -> crate::Result<Option<WorkerGuard>> {
    let directive = filter_directive(&options.level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let console = match options.format {
        LogFormat::Text => fmt::layer().with_ansi(true).with_timer(LocalTimer).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(LocalTimer)
            .boxed(),
    };

    let (file_layer, guard) = match &options.dir {
        Some(dir) => {
            fs::ensure_dir_all_sync_with_op("creating log directory", dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok(guard)
}
