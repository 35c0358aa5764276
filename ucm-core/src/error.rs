//! Error types for UCM
//!
//! This module defines the error types used throughout the core: configuration
//! loading, per-record validation, best-effort store persistence, external
//! command execution and focus bookkeeping.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for UCM operations
#[derive(Debug, Error)]
pub enum UcmError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// History/favorites persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// External command errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Focus bookkeeping errors
    #[error("Focus error: {0}")]
    Focus(#[from] FocusError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The connections source is missing or cannot be parsed at all
    #[error("Unable to load {}: {reason}", .path.display())]
    SourceUnreadable {
        /// The file that could not be read
        path: PathBuf,
        /// Why it could not be read
        reason: String,
    },

    /// Invalid value in a single connection being added or edited
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),
}

/// A single invalid connection record found while loading the connections file
///
/// Loading never stops at the first bad record; every record is checked and one
/// `ValidationError` is produced per invalid record, carrying all of its problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// 1-based position of the record in the source sequence
    pub index: usize,
    /// The record's name, if it had a usable one
    pub name: Option<String>,
    /// Human-readable problems found in the record
    pub problems: Vec<String>,
}

impl ValidationError {
    /// Creates a validation error for the record at the given 1-based index
    #[must_use]
    pub fn new(index: usize, name: Option<String>, problems: Vec<String>) -> Self {
        Self {
            index,
            name,
            problems,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Connection #{} ('{}'): ", self.index, name)?,
            None => write!(f, "Connection #{}: ", self.index)?,
        }
        f.write_str(&self.problems.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Recoverable problems reading the history or favorites store
///
/// These never abort anything: the store starts empty and the warning is logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceWarning {
    /// The store file does not exist yet
    #[error("{} does not exist, starting empty", .0.display())]
    Missing(PathBuf),

    /// The store file exists but its content could not be parsed
    #[error("{} is corrupt, starting empty: {reason}", .path.display())]
    Corrupt {
        /// The store file
        path: PathBuf,
        /// Parser error
        reason: String,
    },

    /// The store file could not be read or locked
    #[error("{} could not be read, starting empty: {reason}", .path.display())]
    Unreadable {
        /// The store file
        path: PathBuf,
        /// I/O error
        reason: String,
    },
}

impl PersistenceWarning {
    /// Returns true when the store simply did not exist yet
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

/// Errors raised while saving a store or configuration file
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to acquire the advisory lock guarding the file
    #[error("Failed to lock {}: {reason}", .path.display())]
    Lock {
        /// The file being protected
        path: PathBuf,
        /// I/O error
        reason: String,
    },

    /// Failed to write or atomically replace the file
    #[error("Failed to write {}: {reason}", .path.display())]
    Write {
        /// The file being written
        path: PathBuf,
        /// I/O error
        reason: String,
    },

    /// Failed to serialize the store content
    #[error("Failed to serialize: {0}")]
    Serialize(String),
}

/// Errors related to running external commands (ssh, docker, tmux)
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The command line could not be assembled from the connection fields
    #[error("Cannot build {program} command: {reason}")]
    InvalidCommand {
        /// Program name
        program: String,
        /// What was wrong
        reason: String,
    },

    /// The program could not be started
    #[error("Failed to start {program}: {reason}")]
    Spawn {
        /// Program name
        program: String,
        /// Spawn error
        reason: String,
    },

    /// The program ran but reported failure
    #[error(
        "{program} exited with status {}{}",
        .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()),
        stderr_suffix(.stderr)
    )]
    NonZeroExit {
        /// Program name
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// What the program wrote to stderr, empty if not captured
        stderr: String,
    },

    /// The program did not finish within its deadline and was killed
    #[error("{program} timed out after {}s", .after.as_secs())]
    TimedOut {
        /// Program name
        program: String,
        /// The deadline that elapsed
        after: Duration,
    },

    /// The caller cancelled the command
    #[error("{program} was cancelled")]
    Cancelled {
        /// Program name
        program: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Errors related to keyboard focus bookkeeping
///
/// These indicate a programming error rather than a user-facing condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FocusError {
    /// Focus was moved while no region was registered
    #[error("No focus regions are registered")]
    NoRegions,

    /// A region name was referenced that is not part of the cycle
    #[error("Unknown focus region: {0}")]
    UnknownRegion(String),
}

/// Result type alias for UCM operations
pub type Result<T> = std::result::Result<T, UcmError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for store persistence
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for command execution
pub type ExecResult<T> = std::result::Result<T, ExecutionError>;

/// Result type alias for focus operations
pub type FocusResult<T> = std::result::Result<T, FocusError>;
