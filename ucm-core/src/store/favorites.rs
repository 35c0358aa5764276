//! Favorite connection identities.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{load_yaml, save_yaml};
use crate::error::{PersistenceWarning, StoreResult};
use crate::models::Identity;

/// On-disk favorite record
///
/// Older files stored favorites as `"name:address"` strings; both forms are
/// accepted on read and only the structured form is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FavoriteRecord {
    Identity(Identity),
    Legacy(String),
}

/// Set of favorited identities
#[derive(Debug, Clone, Default)]
pub struct FavoriteStore {
    path: Option<PathBuf>,
    favorites: BTreeSet<Identity>,
}

impl FavoriteStore {
    /// Creates an empty store that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from a YAML file
    ///
    /// A missing or corrupt file yields an empty store and a warning.
    /// Unparseable legacy entries are skipped.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> (Self, Option<PersistenceWarning>) {
        let path = path.into();
        let (records, warning): (Vec<FavoriteRecord>, _) = load_yaml(&path);

        let favorites = records
            .into_iter()
            .filter_map(|record| match record {
                FavoriteRecord::Identity(identity) => Some(identity),
                FavoriteRecord::Legacy(value) => {
                    let parsed = Identity::parse_legacy(&value);
                    if parsed.is_none() {
                        warn!(entry = %value, "Skipping unparseable favorite");
                    }
                    parsed
                }
            })
            .collect::<BTreeSet<_>>();

        debug!(favorites = favorites.len(), "Loaded favorites");
        (
            Self {
                path: Some(path),
                favorites,
            },
            warning,
        )
    }

    /// Writes the store back to its file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be locked or written.
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let records: Vec<FavoriteRecord> = self
            .favorites
            .iter()
            .cloned()
            .map(FavoriteRecord::Identity)
            .collect();
        save_yaml(path, &records)
    }

    /// Returns the backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flips the favorite flag of an identity and returns the new state
    pub fn toggle_favorite(&mut self, identity: &Identity) -> bool {
        if self.favorites.remove(identity) {
            false
        } else {
            self.favorites.insert(identity.clone());
            true
        }
    }

    /// Returns true if the identity is a favorite
    #[must_use]
    pub fn is_favorite(&self, identity: &Identity) -> bool {
        self.favorites.contains(identity)
    }

    /// Moves the favorite flag from one identity to another
    ///
    /// Returns true if `from` was a favorite.
    pub fn rename(&mut self, from: &Identity, to: &Identity) -> bool {
        if !self.favorites.remove(from) {
            return false;
        }
        self.favorites.insert(to.clone());
        true
    }

    /// Iterates favorites in identity order
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.favorites.iter()
    }

    /// Returns the number of favorites
    #[must_use]
    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    /// Returns true if there are no favorites
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toggle_twice_restores() {
        let mut store = FavoriteStore::in_memory();
        let a = Identity::new("a", "1.1.1.1");

        assert!(store.toggle_favorite(&a));
        assert!(store.is_favorite(&a));
        assert!(!store.toggle_favorite(&a));
        assert!(!store.is_favorite(&a));
        assert!(store.is_empty());
    }

    #[test]
    fn test_legacy_and_structured_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("favorites.yml");
        std::fs::write(
            &path,
            "- web:10.0.0.1\n- name: db\n  address: 10.0.0.2\n- garbage\n",
        )
        .unwrap();

        let (store, warning) = FavoriteStore::load(&path);
        assert!(warning.is_none());
        assert_eq!(store.len(), 2);
        assert!(store.is_favorite(&Identity::new("web", "10.0.0.1")));
        assert!(store.is_favorite(&Identity::new("db", "10.0.0.2")));
    }

    #[test]
    fn test_save_writes_structured_form() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("favorites.yml");

        let (mut store, _) = FavoriteStore::load(&path);
        store.toggle_favorite(&Identity::new("web", "10.0.0.1"));
        store.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("name: web"));

        let (reloaded, warning) = FavoriteStore::load(&path);
        assert!(warning.is_none());
        assert!(reloaded.is_favorite(&Identity::new("web", "10.0.0.1")));
    }

    #[test]
    fn test_rename() {
        let mut store = FavoriteStore::in_memory();
        let old = Identity::new("old", "1.1.1.1");
        let new = Identity::new("new", "1.1.1.1");
        store.toggle_favorite(&old);

        assert!(store.rename(&old, &new));
        assert!(!store.is_favorite(&old));
        assert!(store.is_favorite(&new));
        assert!(!store.rename(&old, &new));
    }
}
