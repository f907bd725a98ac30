// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for netdyn binaries
//!
//! Console output is always on. With the `file-logging` feature, a combined log
//! file is written to a timestamped run folder and old run folders are pruned.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::LoggingOptions;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Initialize logging
///
/// `RUST_LOG`, when set, replaces the filter built from `debug_flags` and
/// `options.level`.
///
/// With file logging enabled, creates:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       └── netdyn.log
/// ```
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.level);

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_filter(&filter)?)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let mut file_guards = Vec::new();
    let mut log_dir = None;

    if options.file_logging {
        #[cfg(feature = "file-logging")]
        {
            let run_folder = create_run_folder(&options.log_dir)?;
            cleanup_old_logs(&options.log_dir, options.retention_days, options.retention_runs)?;

            let appender = tracing_appender::rolling::daily(&run_folder, "netdyn.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(build_filter(&filter)?)
                .boxed();
            layers.push(file_layer);
            log_dir = Some(run_folder);
        }
        #[cfg(not(feature = "file-logging"))]
        eprintln!("Warning: file logging requested but netdyn-observability was built without the `file-logging` feature");
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

/// One filter per layer; `RUST_LOG` wins over the flag-derived string
fn build_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .with_context(|| format!("Invalid log filter: {}", filter))
}

/// Initialize console logging at `info` with flags from args and `NETDYN_DEBUG`
pub fn init_logging_default() -> Result<LoggingGuard> {
    init_logging(&crate::cli::parse_debug_flags(), &LoggingOptions::default())
}

/// Create `base/run_<timestamp>`
pub fn create_run_folder(base_log_dir: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

fn parse_run_folder(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let stamp = name.strip_prefix(RUN_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run folders older than `retention_days`, then trim to the newest
/// `retention_runs`. Returns the number of folders removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(stamp) = parse_run_folder(&path) {
            runs.push((path, stamp));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (index, (path, stamp)) in runs.iter().enumerate() {
        if *stamp < cutoff || index >= retention_runs {
            match std::fs::remove_dir_all(path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_run_folder() {
        let stamp = parse_run_folder(Path::new("logs/run_20250101_120000")).unwrap();
        assert_eq!(stamp.format(RUN_TIMESTAMP_FORMAT).to_string(), "20250101_120000");
        assert!(parse_run_folder(Path::new("logs/other")).is_none());
    }

    #[test]
    fn test_cleanup_keeps_newest_runs() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        for hours in 0..4 {
            let stamp = (now - chrono::Duration::hours(hours)).format(RUN_TIMESTAMP_FORMAT);
            std::fs::create_dir_all(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("run_20000101_000000")).unwrap();
        std::fs::create_dir_all(dir.path().join("keep_me")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 30, 2).unwrap();
        assert_eq!(removed, 3);

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.contains(&"keep_me".to_string()));
    }

    #[test]
    fn test_create_run_folder() {
        let dir = tempdir().unwrap();
        let run = create_run_folder(dir.path()).unwrap();
        assert!(run.is_dir());
        assert!(parse_run_folder(&run).is_some());
    }
}
