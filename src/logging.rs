//! Logging setup
//!
//! Console output plus a per-session log file under `settings.log_dir`,
//! named `<strategy>__<YYYY_mm_dd_HH_MM_SS>` and rolled daily with the last
//! few files kept.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::common::errors::{DeskError, Result};

/// Rolled log files kept per session
pub const MAX_LOG_FILES: usize = 5;

/// Log file prefix for a session started at `started_at`
pub fn log_file_prefix(strategy_name: &str, started_at: DateTime<Utc>) -> String {
    format!("{}__{}", strategy_name, started_at.format("%Y_%m_%d_%H_%M_%S"))
}

/// Daily-rolling appender under `log_dir`, created if missing
pub fn file_appender(log_dir: impl AsRef<Path>, prefix: &str) -> Result<RollingFileAppender> {
    let dir = log_dir.as_ref();
    std::fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| {
            DeskError::Configuration(format!("cannot open log file in {}: {}", dir.display(), e))
        })
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level`. The returned guard flushes the file writer
/// and must live until the process exits.
pub fn init_logging(level: &str, json: bool, log_dir: &str, strategy_name: &str) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| DeskError::Configuration(format!("invalid log level '{}': {}", level, e)))?;

    let appender = file_appender(log_dir, &log_file_prefix(strategy_name, Utc::now()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let file = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .map_err(|e| DeskError::Configuration(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_log_file_prefix() {
        let started = Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 3).unwrap();
        assert_eq!(log_file_prefix("momentum1", started), "momentum1__2024_05_17_08_00_03");
    }

    #[test]
    fn test_file_appender_creates_dir_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let mut appender = file_appender(&log_dir, "momentum1__2024_05_17_08_00_03").unwrap();

        appender.write_all(b"cycle aborted\n").unwrap();
        appender.flush().unwrap();

        let files: Vec<_> = std::fs::read_dir(&log_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("momentum1__2024_05_17_08_00_03"));
        assert!(files[0].ends_with(".log"));

        let content = std::fs::read_to_string(log_dir.join(&files[0])).unwrap();
        assert!(content.contains("cycle aborted"));
    }
}
