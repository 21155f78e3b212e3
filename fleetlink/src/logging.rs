//! Tracing bootstrap.
//!
//! One subscriber serves the whole process: a non-blocking file layer
//! under the log directory, truncated at startup so every run reads
//! from the top, plus an ANSI stdout layer for interactive use.
//! Verbosity follows `RUST_LOG`, falling back to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive.
///
/// Dropping it flushes whatever the writer still buffers, so hold on
/// to it for as long as the process logs.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the process-wide subscriber.
///
/// `log_dir` is created on demand and `log_file` inside it is
/// truncated before the file layer attaches to it.
///
/// # Errors
///
/// Fails if the directory or file cannot be prepared, or if another
/// subscriber was installed first.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    // Defaults to INFO if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_creates_directory() {
        let dir = std::env::temp_dir().join("fleetlink-logging-test");
        let dir_str = dir.to_str().unwrap();

        // The global subscriber may already be set by another test; only
        // the filesystem side effects are asserted here.
        let _ = init_logging(dir_str, "test.log");
        assert!(dir.join("test.log").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
