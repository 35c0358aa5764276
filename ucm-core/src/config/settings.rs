//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.
//! Every field has a serde default so partial files load cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_MAX_ENTRIES;

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Terminal integration settings
    #[serde(default)]
    pub terminal: TerminalSettings,
    /// Connection history settings
    #[serde(default)]
    pub history: HistorySettings,
    /// Docker settings
    #[serde(default)]
    pub docker: DockerSettings,
    /// UI settings
    #[serde(default)]
    pub ui: UiSettings,
}

/// Where connection commands are launched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalIntegration {
    /// Run in the current terminal, suspending the UI
    #[default]
    None,
    /// Open a new tmux window when running inside tmux
    Tmux,
}

/// Terminal-related settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Terminal integration mode
    #[serde(default)]
    pub integration: TerminalIntegration,
    /// Name new tmux windows after the connection
    #[serde(default = "default_true")]
    pub tmux_auto_name: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            integration: TerminalIntegration::default(),
            tmux_auto_name: true,
        }
    }
}

/// Connection history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Maximum number of history entries to keep
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

const fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Docker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerSettings {
    /// Docker client binary
    #[serde(default = "default_docker_binary")]
    pub binary: String,
    /// Preferred shell for `docker exec`
    #[serde(default = "default_docker_shell")]
    pub shell: String,
    /// Seconds to wait for stop/start/restart/remove before giving up
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,
    /// Number of existing log lines to show when following logs
    #[serde(default = "default_log_tail")]
    pub log_tail: u32,
    /// Lines buffered while a log view is paused
    #[serde(default = "default_log_buffer")]
    pub log_buffer_lines: usize,
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_docker_shell() -> String {
    "bash".to_string()
}

const fn default_action_timeout() -> u64 {
    10
}

const fn default_log_tail() -> u32 {
    100
}

const fn default_log_buffer() -> usize {
    1000
}

impl DockerSettings {
    /// Returns the lifecycle action timeout
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            binary: default_docker_binary(),
            shell: default_docker_shell(),
            action_timeout_secs: default_action_timeout(),
            log_tail: default_log_tail(),
            log_buffer_lines: default_log_buffer(),
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Start with the list sorted by most recent use
    #[serde(default)]
    pub sort_by_recent: bool,
    /// Seconds a status message stays visible
    #[serde(default = "default_status_secs")]
    pub status_timeout_secs: u64,
}

const fn default_status_secs() -> u64 {
    3
}

impl UiSettings {
    /// Returns how long status messages stay visible
    #[must_use]
    pub const fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            sort_by_recent: false,
            status_timeout_secs: default_status_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: AppSettings = toml::from_str(
            "[terminal]\nintegration = \"tmux\"\n\n[docker]\nshell = \"sh\"\n",
        )
        .unwrap();

        assert_eq!(settings.terminal.integration, TerminalIntegration::Tmux);
        assert!(settings.terminal.tmux_auto_name);
        assert_eq!(settings.docker.shell, "sh");
        assert_eq!(settings.docker.binary, "docker");
        assert_eq!(settings.docker.action_timeout(), Duration::from_secs(10));
        assert_eq!(settings.history.max_entries, 100);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let settings: AppSettings = toml::from_str("").unwrap();
        assert_eq!(settings, AppSettings::default());
    }
}
