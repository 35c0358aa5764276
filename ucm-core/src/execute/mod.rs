//! External command execution
//!
//! The core hands fully assembled [`CommandSpec`]s to an [`Executor`] and only
//! consumes the exit status, captured output, or a log stream. Timeouts and
//! cancellation are explicit [`ExecOptions`], so a lifecycle action can never
//! hang the input loop.

mod cancel;
mod command;
mod launch;
mod process;
#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelHandle;
pub use command::{
    docker_action, docker_exec, docker_logs, docker_ps, inside_tmux, needs_shell_fallback,
    ssh_command, wrap_in_tmux, Action, CommandSpec, FALLBACK_SHELL, PS_FORMAT,
};
pub use launch::Launcher;
pub use process::ProcessExecutor;

use std::time::Duration;

use crate::error::{ExecResult, ExecutionError};
use crate::stream::LogSubscription;

/// Exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
}

impl ExitStatus {
    /// A status with the given exit code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// A status for a process terminated by a signal
    #[must_use]
    pub const fn signaled() -> Self {
        Self { code: None }
    }

    /// Returns the exit code, if the process exited normally
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns true for exit code 0
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Converts a non-zero status into an error
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::NonZeroExit`] unless the status is success.
    pub fn check(self, program: &str) -> ExecResult<()> {
        if self.success() {
            Ok(())
        } else {
            Err(ExecutionError::NonZeroExit {
                program: program.to_string(),
                code: self.code,
                stderr: String::new(),
            })
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// How a command is run
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Kill the command and fail after this long
    pub timeout: Option<Duration>,
    /// Kill the command and fail when this is cancelled
    pub cancel: Option<CancelHandle>,
    /// Hand the terminal to the command (connect sessions)
    pub interactive: bool,
}

impl ExecOptions {
    /// Options for an interactive session: no timeout, terminal attached
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    /// Options for a background command with a deadline
    #[must_use]
    pub fn bounded(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Adds a cancellation handle
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Runs external commands on behalf of the core
///
/// Implementations enforce `options.timeout` and `options.cancel`
/// themselves and return promptly when either fires.
pub trait Executor {
    /// Runs a command to completion and returns its exit status
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started, times out, or is
    /// cancelled. A non-zero exit is not an error here.
    fn execute(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<ExitStatus>;

    /// Runs a command and returns its standard output
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started, times out, is
    /// cancelled, or exits with a non-zero status.
    fn capture(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<String>;

    /// Starts a long-running command and subscribes to its output lines
    ///
    /// At most `capacity` lines are buffered while the subscription is
    /// paused; beyond that the producer blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started.
    fn stream(&mut self, spec: &CommandSpec, capacity: usize) -> ExecResult<LogSubscription>;
}
