//! Configuration management for UCM
//!
//! This module provides the `ConfigManager` for loading and validating the
//! YAML connections file and for the TOML application settings.

mod manager;
pub mod settings;

pub use manager::{ConfigManager, LoadReport};
pub use settings::{
    AppSettings, DockerSettings, HistorySettings, TerminalIntegration, TerminalSettings,
    UiSettings,
};
