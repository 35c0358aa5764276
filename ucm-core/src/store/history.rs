//! Bounded connection usage history.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{load_yaml, save_yaml};
use crate::error::{PersistenceWarning, StoreResult};
use crate::models::{Connection, HistoryEntry, HistoryStats, Identity};

/// Default maximum number of history entries
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Per-identity usage history with a fixed capacity
///
/// [`HistoryStore::record_use`] is the only write path. Updating an identity
/// that is already present never evicts; inserting a new identity into a full
/// store evicts the entry with the oldest `last_used`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: Vec<HistoryEntry>,
    max_entries: usize,
}

impl HistoryStore {
    /// Creates an empty store that is never written to disk
    #[must_use]
    pub fn in_memory(max_entries: usize) -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Loads the store from a YAML file
    ///
    /// A missing or corrupt file yields an empty store and a warning. A file
    /// holding more entries than `max_entries` is trimmed to the most recent
    /// ones.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, max_entries: usize) -> (Self, Option<PersistenceWarning>) {
        let path = path.into();
        let (mut entries, warning): (Vec<HistoryEntry>, _) = load_yaml(&path);

        for entry in &mut entries {
            entry.use_count = entry.use_count.max(1);
        }

        let mut store = Self {
            path: Some(path),
            entries,
            max_entries: max_entries.max(1),
        };
        store.trim_to_capacity();

        debug!(entries = store.entries.len(), "Loaded history");
        (store, warning)
    }

    /// Writes the store back to its file
    ///
    /// In-memory stores succeed without doing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be locked or written.
    pub fn save(&self) -> StoreResult<()> {
        match &self.path {
            Some(path) => save_yaml(path, &self.entries),
            None => Ok(()),
        }
    }

    /// Returns the backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the capacity of the store
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Records one use of an identity at the given time
    pub fn record_use(&mut self, identity: &Identity, at: DateTime<Utc>) -> &HistoryEntry {
        self.upsert(identity, at, || HistoryEntry::new(identity, at))
    }

    /// Records one use of a connection, keeping its user and category on first use
    pub fn record_connection_use(
        &mut self,
        connection: &Connection,
        at: DateTime<Utc>,
    ) -> &HistoryEntry {
        let identity = connection.identity();
        self.upsert(&identity, at, || HistoryEntry::for_connection(connection, at))
    }

    fn upsert(
        &mut self,
        identity: &Identity,
        at: DateTime<Utc>,
        create: impl FnOnce() -> HistoryEntry,
    ) -> &HistoryEntry {
        let index = if let Some(pos) = self.position(identity) {
            self.entries[pos].touch(at);
            pos
        } else {
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
            self.entries.push(create());
            self.entries.len() - 1
        };
        &self.entries[index]
    }

    fn position(&self, identity: &Identity) -> Option<usize> {
        self.entries.iter().position(|e| e.is_for(identity))
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(i, _)| i);
        if let Some(i) = oldest {
            let evicted = self.entries.remove(i);
            debug!(identity = %evicted.identity(), "Evicted oldest history entry");
        }
    }

    fn trim_to_capacity(&mut self) {
        while self.entries.len() > self.max_entries {
            self.evict_oldest();
        }
    }

    /// Returns the entry for an identity, if it has been used
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.is_for(identity))
    }

    /// Returns the identity with the latest `last_used`
    #[must_use]
    pub fn most_recent(&self) -> Option<Identity> {
        self.entries
            .iter()
            .max_by_key(|e| e.last_used)
            .map(HistoryEntry::identity)
    }

    /// Returns up to `limit` entries, most recently used first
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&HistoryEntry> {
        let mut entries: Vec<&HistoryEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        entries.truncate(limit);
        entries
    }

    /// Returns all entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns the number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves the history of one identity to another
    ///
    /// If the target already has an entry, the two are merged: counts are
    /// summed and the later `last_used` wins. Returns true if anything moved.
    pub fn rename(&mut self, from: &Identity, to: &Identity) -> bool {
        if from == to {
            return false;
        }
        let Some(pos) = self.position(from) else {
            return false;
        };
        let mut moved = self.entries.remove(pos);

        if let Some(existing) = self.entries.iter_mut().find(|e| e.is_for(to)) {
            existing.use_count = existing.use_count.saturating_add(moved.use_count);
            existing.last_used = existing.last_used.max(moved.last_used);
        } else {
            moved.name.clone_from(&to.name);
            moved.address.clone_from(&to.address);
            self.entries.insert(pos, moved);
        }
        true
    }

    /// Computes aggregate statistics
    #[must_use]
    pub fn stats(&self, favorites_count: usize) -> HistoryStats {
        HistoryStats {
            total_connections: self.entries.len(),
            total_uses: self.entries.iter().map(|e| u64::from(e.use_count)).sum(),
            favorites_count,
            most_used: self.entries.iter().max_by_key(|e| e.use_count).cloned(),
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory(DEFAULT_MAX_ENTRIES)
    }
}
