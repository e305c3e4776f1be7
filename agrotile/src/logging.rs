//! Tracing subscriber setup.
//!
//! Events go to two sinks: a log file that is truncated at startup, and
//! stdout. Filtering follows `RUST_LOG`, defaulting to `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to prepare log file {path}: {source}")]
    LogFile { path: PathBuf, source: io::Error },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Flushes the file writer when dropped. Hold it for the process lifetime.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates `dir` if needed and empties `dir/file`.
pub fn prepare_log_file(dir: &Path, file: &str) -> Result<PathBuf, LoggingError> {
    let path = dir.join(file);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, ""))
        .map_err(|source| LoggingError::LogFile {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Installs the global subscriber writing to `dir/file` and stdout.
pub fn init_logging(dir: &Path, file: &str) -> Result<LoggingGuard, LoggingError> {
    let path = prepare_log_file(dir, file)?;

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}
