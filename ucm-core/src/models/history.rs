//! Connection usage history models
//!
//! This module provides the per-connection usage record kept by the history
//! store and the aggregate statistics derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connection::{Connection, Identity};

/// Usage record for one connection identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Connection name at the time of use
    pub name: String,
    /// Connection address at the time of use
    pub address: String,
    /// When the connection was last used
    pub last_used: DateTime<Utc>,
    /// How many times the connection has been used (always at least 1)
    #[serde(default = "default_use_count")]
    pub use_count: u32,
    /// Username at the time of first use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Category at the time of first use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

const fn default_use_count() -> u32 {
    1
}

impl HistoryEntry {
    /// Creates a first-use entry for an identity
    #[must_use]
    pub fn new(identity: &Identity, at: DateTime<Utc>) -> Self {
        Self {
            name: identity.name.clone(),
            address: identity.address.clone(),
            last_used: at,
            use_count: 1,
            user: None,
            category: None,
        }
    }

    /// Creates a first-use entry carrying the connection's descriptive fields
    #[must_use]
    pub fn for_connection(connection: &Connection, at: DateTime<Utc>) -> Self {
        Self {
            user: connection.user.clone(),
            category: connection.category.clone(),
            ..Self::new(&connection.identity(), at)
        }
    }

    /// Returns the identity this entry belongs to
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.address.clone())
    }

    /// Returns true if this entry belongs to the given identity
    #[must_use]
    pub fn is_for(&self, identity: &Identity) -> bool {
        self.name == identity.name && self.address == identity.address
    }

    /// Records another use
    ///
    /// `last_used` never moves backwards, so a skewed clock cannot make a
    /// freshly used entry look older than it was.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_used {
            self.last_used = at;
        }
        self.use_count = self.use_count.saturating_add(1);
    }

    /// Formats the time since last use (e.g., "5m ago", "2d ago")
    #[must_use]
    pub fn format_age(&self, now: DateTime<Utc>) -> String {
        let seconds = (now - self.last_used).num_seconds().max(0);
        if seconds < 60 {
            return "just now".to_string();
        }

        let minutes = seconds / 60;
        let hours = minutes / 60;
        let days = hours / 24;

        if days > 0 {
            format!("{days}d ago")
        } else if hours > 0 {
            format!("{hours}h ago")
        } else {
            format!("{minutes}m ago")
        }
    }
}

/// Aggregate usage statistics across the history and favorites stores
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryStats {
    /// Number of distinct identities in the history
    pub total_connections: usize,
    /// Sum of all use counts
    pub total_uses: u64,
    /// Number of favorited identities
    pub favorites_count: usize,
    /// The entry with the highest use count
    pub most_used: Option<HistoryEntry>,
}
