//! Command-line assembly for ssh, docker and tmux
//!
//! Commands are plain argument vectors. Nothing here goes through a shell,
//! except the single joined command string handed to `tmux new-window`.

use std::fmt;

use crate::config::DockerSettings;
use crate::error::{ExecResult, ExecutionError};
use crate::models::Connection;

use super::ExitStatus;

/// `docker ps` output template; fields are tab separated
pub const PS_FORMAT: &str = "{{.ID}}\t{{.Names}}\t{{.Image}}\t{{.Status}}";

/// Fallback shell when the configured one is missing in a container
pub const FALLBACK_SHELL: &str = "sh";

/// What a command does, passed through to the executor verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Interactive session (ssh or docker exec)
    Connect,
    /// Stop a container
    Stop,
    /// Start a container
    Start,
    /// Restart a container
    Restart,
    /// Remove a container
    Remove,
    /// Follow container logs
    Logs,
    /// Inspect a container
    Inspect,
    /// List containers
    List,
}

impl Action {
    /// Lowercase verb used in status messages and logs
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Stop => "stop",
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Remove => "remove",
            Self::Logs => "logs",
            Self::Inspect => "inspect",
            Self::List => "list",
        }
    }

    /// Returns true for stop/start/restart/remove
    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::Stop | Self::Start | Self::Restart | Self::Remove)
    }

    /// Docker subcommand for lifecycle and inspection actions
    const fn docker_subcommand(self) -> Option<&'static str> {
        match self {
            Self::Stop => Some("stop"),
            Self::Start => Some("start"),
            Self::Restart => Some("restart"),
            Self::Remove => Some("rm"),
            Self::Inspect => Some("inspect"),
            Self::Connect | Self::Logs | Self::List => None,
        }
    }
}

/// A fully assembled external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to run
    pub program: String,
    /// Arguments, one element per argv entry
    pub args: Vec<String>,
    /// What the command does
    pub action: Action,
}

impl CommandSpec {
    /// Creates a command with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>, action: Action) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            action,
        }
    }

    /// Appends one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the command as a single shell-quoted line
    #[must_use]
    pub fn to_shell_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_line())
    }
}

// ========== SSH ==========

/// Builds `ssh [-i key] [-p port] [options...] [user@]address`
///
/// The identity file path is tilde-expanded; options are split with shell
/// quoting rules.
///
/// # Errors
///
/// Returns [`ExecutionError::InvalidCommand`] if the options string has
/// unbalanced quotes.
pub fn ssh_command(connection: &Connection) -> ExecResult<CommandSpec> {
    let mut spec = CommandSpec::new("ssh", Action::Connect);

    if let Some(identity_file) = &connection.identity_file {
        spec = spec
            .arg("-i")
            .arg(shellexpand::tilde(identity_file).into_owned());
    }

    if let Some(port) = connection.port {
        spec = spec.arg("-p").arg(port.to_string());
    }

    if let Some(options) = &connection.options {
        let options = shell_words::split(options).map_err(|e| ExecutionError::InvalidCommand {
            program: "ssh".to_string(),
            reason: format!("options for '{}': {e}", connection.name),
        })?;
        spec = spec.args(options);
    }

    Ok(spec.arg(connection.destination()))
}

// ========== Docker ==========

/// Builds `docker exec -it <name> <shell>`
#[must_use]
pub fn docker_exec(settings: &DockerSettings, container: &str, shell: &str) -> CommandSpec {
    CommandSpec::new(&settings.binary, Action::Connect)
        .args(["exec", "-it", container, shell])
}

/// Returns true if `docker exec` failed because the shell is missing
#[must_use]
pub fn needs_shell_fallback(status: ExitStatus) -> bool {
    matches!(status.code(), Some(126 | 127))
}

/// Builds a lifecycle or inspection command for a container
///
/// Returns `None` for actions that are not single-container docker
/// subcommands (connect, logs and list have dedicated builders).
#[must_use]
pub fn docker_action(
    settings: &DockerSettings,
    action: Action,
    container: &str,
) -> Option<CommandSpec> {
    let subcommand = action.docker_subcommand()?;
    Some(CommandSpec::new(&settings.binary, action).args([subcommand, container]))
}

/// Builds `docker logs -f --tail <n> <name>`
#[must_use]
pub fn docker_logs(settings: &DockerSettings, container: &str) -> CommandSpec {
    CommandSpec::new(&settings.binary, Action::Logs)
        .args(["logs", "-f", "--tail"])
        .arg(settings.log_tail.to_string())
        .arg(container)
}

/// Builds `docker ps [-a] --format ...`
#[must_use]
pub fn docker_ps(settings: &DockerSettings, all: bool) -> CommandSpec {
    let mut spec = CommandSpec::new(&settings.binary, Action::List).arg("ps");
    if all {
        spec = spec.arg("-a");
    }
    spec.args(["--format", PS_FORMAT])
}

// ========== tmux ==========

/// Returns true if this process runs inside a tmux session
#[must_use]
pub fn inside_tmux() -> bool {
    std::env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}

/// Wraps a command so it runs in a new tmux window
#[must_use]
pub fn wrap_in_tmux(spec: &CommandSpec, window_name: Option<&str>) -> CommandSpec {
    let mut wrapped = CommandSpec::new("tmux", spec.action).arg("new-window");
    if let Some(name) = window_name {
        wrapped = wrapped.arg("-n").arg(name);
    }
    wrapped.arg("--").arg(spec.to_shell_line())
}
