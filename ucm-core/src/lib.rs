//! `ucm` Core Library
//!
//! This crate provides the interactive state core of the `ucm` connection
//! manager: connection configuration, usage history and favorites, the
//! filter and focus state machines, the SSH and Docker list controllers, and
//! the session that dispatches input events to them.

pub mod config;
pub mod docker;
pub mod error;
pub mod execute;
pub mod filter;
pub mod focus;
pub mod input;
pub mod list;
pub mod models;
pub mod render;
pub mod session;
pub mod store;
pub mod stream;

pub use config::{AppSettings, ConfigManager, LoadReport};
pub use docker::{parse_ps_output, ContainerListController};
pub use error::{
    ConfigError, ConfigResult, ExecResult, ExecutionError, FocusError, FocusResult,
    PersistenceWarning, Result, StoreError, StoreResult, UcmError, ValidationError,
};
pub use execute::{
    Action, CancelHandle, CommandSpec, ExecOptions, ExitStatus, Executor, Launcher,
    ProcessExecutor,
};
pub use filter::{FilterEngine, FilterMode, FilterResponse, Matcher, SearchField, Searchable};
pub use focus::{Direction, FocusChange, FocusController};
pub use input::{Event, Key, View};
pub use list::{ConnectionListController, EditTicket, OpenReport, Row, SortPolicy};
pub use models::{Connection, Container, HistoryEntry, HistoryStats, Identity};
pub use render::{Frame, FrameRows, Panel, Renderer, StatusLevel, StatusMessage};
pub use session::{Command, FocusTarget, Mnemonic, Outcome, Session};
pub use store::{FavoriteStore, HistoryStore};
pub use stream::{LogSender, LogSubscription};
