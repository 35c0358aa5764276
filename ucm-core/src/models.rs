//! Core data models for UCM
//!
//! This module defines the primary data structures used throughout UCM:
//! connection definitions and their identities, usage history entries and
//! Docker containers.

mod connection;
mod container;
mod history;

pub use connection::{Connection, Identity};
pub use container::Container;
pub use history::{HistoryEntry, HistoryStats};
