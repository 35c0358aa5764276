//! Tracing subscriber initialization for the `ucm` binary.
//!
//! Logs always go to a file: the interactive UI owns the terminal, so a
//! stderr writer would paint over it.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `RUST_LOG` env var
//! 2. `--log-level`
//! 3. Default level: `info`

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::CliError;

/// Default filter directive when neither `RUST_LOG` nor `--log-level` is set
pub const DEFAULT_LEVEL: &str = "info";

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Returns the default log file: `<tmp>/ucm-<user>.log`
#[must_use]
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join(format!("ucm-{}.log", whoami::username()))
}

/// Installs the global subscriber
///
/// The returned guard flushes buffered lines when dropped and must be kept
/// alive until the program exits.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init(level: &str, format: LogFormat, file: &Path) -> Result<WorkerGuard, CliError> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| CliError::Logging(format!("Cannot open {}: {e}", file.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(build_env_filter(level));
    let result = match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
    result.map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}

/// Builds the filter, preferring `RUST_LOG` over the CLI level
fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_file() {
        let path = default_log_file();
        assert!(path.starts_with(std::env::temp_dir()));

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ucm-"));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_unopenable_log_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("ucm.log");

        let err = init("debug", LogFormat::Text, &path).unwrap_err();
        assert!(matches!(err, CliError::Logging(_)));
    }
}
