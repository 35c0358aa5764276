//! Interactive launch planning.

use tracing::debug;

use super::command::{inside_tmux, wrap_in_tmux};
use super::{CommandSpec, ExecOptions};
use crate::config::{TerminalIntegration, TerminalSettings};

/// Decides where an interactive command runs
///
/// With tmux integration enabled and a tmux session present, connect
/// commands open in a new window and the UI keeps running; otherwise the
/// command takes over the current terminal.
#[derive(Debug, Clone)]
pub struct Launcher {
    terminal: TerminalSettings,
    in_tmux: bool,
}

impl Launcher {
    /// Creates a launcher, detecting tmux from the environment
    #[must_use]
    pub fn new(terminal: TerminalSettings) -> Self {
        Self::with_tmux_detected(terminal, inside_tmux())
    }

    /// Creates a launcher with an explicit tmux detection result
    #[must_use]
    pub const fn with_tmux_detected(terminal: TerminalSettings, in_tmux: bool) -> Self {
        Self { terminal, in_tmux }
    }

    /// Returns true if commands will open in tmux windows
    #[must_use]
    pub fn uses_tmux(&self) -> bool {
        self.terminal.integration == TerminalIntegration::Tmux && self.in_tmux
    }

    /// Returns the command to run and how to run it
    #[must_use]
    pub fn prepare(&self, spec: &CommandSpec, window_name: &str) -> (CommandSpec, ExecOptions) {
        if self.uses_tmux() {
            let name = self.terminal.tmux_auto_name.then_some(window_name);
            let wrapped = wrap_in_tmux(spec, name);
            debug!(command = %wrapped, "Launching in tmux window");
            (wrapped, ExecOptions::default())
        } else {
            (spec.clone(), ExecOptions::interactive())
        }
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::with_tmux_detected(TerminalSettings::default(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::Action;

    fn tmux_settings(auto_name: bool) -> TerminalSettings {
        TerminalSettings {
            integration: TerminalIntegration::Tmux,
            tmux_auto_name: auto_name,
        }
    }

    #[test]
    fn test_plain_terminal_is_interactive() {
        let spec = CommandSpec::new("ssh", Action::Connect).arg("host");
        let (cmd, opts) = Launcher::default().prepare(&spec, "host");
        assert_eq!(cmd, spec);
        assert!(opts.interactive);
    }

    #[test]
    fn test_tmux_requires_session() {
        let launcher = Launcher::with_tmux_detected(tmux_settings(true), false);
        assert!(!launcher.uses_tmux());
    }

    #[test]
    fn test_tmux_window_naming() {
        let spec = CommandSpec::new("ssh", Action::Connect).arg("host");

        let (cmd, opts) = Launcher::with_tmux_detected(tmux_settings(true), true).prepare(&spec, "web");
        assert_eq!(cmd.args, vec!["new-window", "-n", "web", "--", "ssh host"]);
        assert!(!opts.interactive);

        let (cmd, _) = Launcher::with_tmux_detected(tmux_settings(false), true).prepare(&spec, "web");
        assert_eq!(cmd.args, vec!["new-window", "--", "ssh host"]);
    }
}
