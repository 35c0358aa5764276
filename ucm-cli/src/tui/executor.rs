//! Executor that suspends the UI around interactive commands

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use ucm_core::{
    CommandSpec, ExecOptions, ExecResult, ExitStatus, Executor, LogSubscription, ProcessExecutor,
};

use super::terminal;

/// Wraps [`ProcessExecutor`], leaving the alternate screen while an
/// interactive command (ssh, docker exec) owns the terminal
///
/// `resumed` is raised whenever the UI comes back, since the screen no
/// longer shows what the renderer last drew.
#[derive(Debug)]
pub struct TerminalExecutor {
    inner: ProcessExecutor,
    resumed: Arc<AtomicBool>,
}

impl TerminalExecutor {
    /// Creates an executor around a default [`ProcessExecutor`]
    #[must_use]
    pub fn new(resumed: Arc<AtomicBool>) -> Self {
        Self {
            inner: ProcessExecutor::new(),
            resumed,
        }
    }
}

impl Executor for TerminalExecutor {
    fn execute(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<ExitStatus> {
        if !options.interactive {
            return self.inner.execute(spec, options);
        }

        debug!(command = %spec, "Suspending UI");
        if let Err(e) = terminal::leave() {
            warn!(error = %e, "Failed to restore terminal before command");
        }
        let result = self.inner.execute(spec, options);
        if let Err(e) = terminal::enter() {
            warn!(error = %e, "Failed to re-enter UI mode");
        }
        self.resumed.store(true, Ordering::Release);
        result
    }

    fn capture(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<String> {
        self.inner.capture(spec, options)
    }

    fn stream(&mut self, spec: &CommandSpec, capacity: usize) -> ExecResult<LogSubscription> {
        self.inner.stream(spec, capacity)
    }
}
