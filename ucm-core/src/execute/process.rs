//! `std::process` backed executor.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{CommandSpec, ExecOptions, ExitStatus, Executor};
use crate::error::{ExecResult, ExecutionError};
use crate::stream::{LogSender, LogSubscription};

/// Default interval between exit checks while a deadline is pending
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs commands as child processes
///
/// Deadlines and cancellation are enforced by polling the child and killing
/// it when either fires, so `execute` returns within one poll interval.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    poll_interval: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor {
    /// Creates an executor with the default poll interval
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Creates an executor with a custom poll interval
    #[must_use]
    pub const fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd
    }

    fn spawn(spec: &CommandSpec, cmd: &mut Command) -> ExecResult<Child> {
        debug!(command = %spec, action = spec.action.verb(), "Spawning command");
        cmd.spawn().map_err(|e| ExecutionError::Spawn {
            program: spec.program.clone(),
            reason: e.to_string(),
        })
    }

    fn wait(
        &self,
        spec: &CommandSpec,
        child: &mut Child,
        options: &ExecOptions,
    ) -> ExecResult<ExitStatus> {
        let wait_err = |e: std::io::Error| ExecutionError::Spawn {
            program: spec.program.clone(),
            reason: e.to_string(),
        };

        if options.timeout.is_none() && options.cancel.is_none() {
            return child.wait().map(ExitStatus::from).map_err(wait_err);
        }

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(status.into());
            }

            if options.cancel.as_ref().is_some_and(super::CancelHandle::is_cancelled) {
                kill(child);
                info!(command = %spec, "Command cancelled");
                return Err(ExecutionError::Cancelled {
                    program: spec.program.clone(),
                });
            }

            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    kill(child);
                    warn!(command = %spec, timeout_secs = timeout.as_secs(), "Command timed out");
                    return Err(ExecutionError::TimedOut {
                        program: spec.program.clone(),
                        after: timeout,
                    });
                }
            }

            thread::sleep(self.poll_interval);
        }
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Kill failed, process already exited");
    }
    let _ = child.wait();
}

/// Reads a pipe to EOF on its own thread so a full pipe never blocks the child
fn read_all<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            debug!(error = %e, "Pipe read ended early");
        }
        buf
    })
}

fn join_output(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// Forwards lines from a pipe until EOF or cancellation
fn forward_lines<R: Read + Send + 'static>(reader: R, sender: LogSender) {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if !sender.send(line) {
                        break;
                    }
                }
            }
        }
    });
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<ExitStatus> {
        let mut cmd = Self::command(spec);
        if !options.interactive {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        let mut child = Self::spawn(spec, &mut cmd)?;
        let status = self.wait(spec, &mut child, options)?;
        debug!(command = %spec, code = ?status.code(), "Command finished");
        Ok(status)
    }

    fn capture(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<String> {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = Self::spawn(spec, &mut cmd)?;
        let stdout = child.stdout.take().map(read_all);
        let stderr = child.stderr.take().map(read_all);

        let status = self.wait(spec, &mut child, options)?;
        let output = join_output(stdout);

        if status.success() {
            Ok(output)
        } else {
            Err(ExecutionError::NonZeroExit {
                program: spec.program.clone(),
                code: status.code(),
                stderr: join_output(stderr),
            })
        }
    }

    fn stream(&mut self, spec: &CommandSpec, capacity: usize) -> ExecResult<LogSubscription> {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = Self::spawn(spec, &mut cmd)?;
        let (sender, subscription) = LogSubscription::channel(capacity);

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, sender.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, sender);
        }

        Ok(subscription.with_child(child))
    }
}
