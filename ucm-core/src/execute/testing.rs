//! Scripted executor for unit tests.

use std::collections::VecDeque;

use super::{CommandSpec, ExecOptions, ExitStatus, Executor};
use crate::error::{ExecResult, ExecutionError};
use crate::stream::{LogSender, LogSubscription};

/// Records every command and replays queued results
///
/// Unscripted `execute` calls succeed with exit code 0 and unscripted
/// `capture` calls return an empty string.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    pub calls: Vec<(CommandSpec, ExecOptions)>,
    pub statuses: VecDeque<ExecResult<ExitStatus>>,
    pub outputs: VecDeque<ExecResult<String>>,
    pub streams: Vec<LogSender>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&mut self, code: i32) {
        self.statuses.push_back(Ok(ExitStatus::from_code(code)));
    }

    pub fn push_timeout(&mut self, program: &str) {
        self.statuses.push_back(Err(ExecutionError::TimedOut {
            program: program.to_string(),
            after: std::time::Duration::from_secs(10),
        }));
    }

    pub fn push_output(&mut self, output: &str) {
        self.outputs.push_back(Ok(output.to_string()));
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.iter().map(|(spec, _)| spec.to_string()).collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<ExitStatus> {
        self.calls.push((spec.clone(), options.clone()));
        self.statuses
            .pop_front()
            .unwrap_or(Ok(ExitStatus::from_code(0)))
    }

    fn capture(&mut self, spec: &CommandSpec, options: &ExecOptions) -> ExecResult<String> {
        self.calls.push((spec.clone(), options.clone()));
        self.outputs.pop_front().unwrap_or_else(|| Ok(String::new()))
    }

    fn stream(&mut self, spec: &CommandSpec, capacity: usize) -> ExecResult<LogSubscription> {
        self.calls.push((spec.clone(), ExecOptions::default()));
        let (sender, subscription) = LogSubscription::channel(capacity);
        self.streams.push(sender);
        Ok(subscription)
    }
}
