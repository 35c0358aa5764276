//! Property tests for the favorite set
//!
//! Covers toggle idempotence (two toggles restore the previous state) and
//! persistence of the structured and legacy file forms.

use proptest::prelude::*;
use std::collections::BTreeSet;
use tempfile::TempDir;
use ucm_core::{FavoriteStore, Identity};

// ========== Generators ==========

fn arb_identity() -> impl Strategy<Value = Identity> {
    ("[a-z][a-z0-9-]{0,10}", "[a-z]{3,8}\\.[a-z]{2,3}")
        .prop_map(|(name, address)| Identity::new(name, address))
}

fn arb_identities() -> impl Strategy<Value = Vec<Identity>> {
    prop::collection::vec(arb_identity(), 0..20)
}

fn snapshot(store: &FavoriteStore) -> BTreeSet<Identity> {
    store.iter().cloned().collect()
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Toggling the same identity twice restores the store
    #[test]
    fn prop_toggle_twice_is_identity(initial in arb_identities(), x in arb_identity()) {
        let mut store = FavoriteStore::in_memory();
        for id in &initial {
            if !store.is_favorite(id) {
                store.toggle_favorite(id);
            }
        }
        let before = snapshot(&store);
        let was_favorite = store.is_favorite(&x);

        let first = store.toggle_favorite(&x);
        prop_assert_eq!(first, !was_favorite);
        prop_assert_eq!(store.is_favorite(&x), first);

        let second = store.toggle_favorite(&x);
        prop_assert_eq!(second, was_favorite);
        prop_assert_eq!(snapshot(&store), before);
    }

    /// Favorites survive a save/load cycle
    #[test]
    fn prop_favorites_round_trip(ids in arb_identities()) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("favorites.yml");

        let (mut store, _) = FavoriteStore::load(&path);
        for id in &ids {
            store.toggle_favorite(id);
        }
        store.save().unwrap();

        let (loaded, warning) = FavoriteStore::load(&path);
        prop_assert!(warning.is_none());
        prop_assert_eq!(snapshot(&loaded), snapshot(&store));
    }
}

// ========== Scenarios ==========

#[test]
fn test_legacy_entries_are_read() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("favorites.yml");
    std::fs::write(
        &path,
        "- web:10.0.0.1\n- name: db\n  address: 10.0.0.5\n- not-a-favorite\n",
    )
    .unwrap();

    let (store, warning) = FavoriteStore::load(&path);
    assert!(warning.is_none());
    assert_eq!(store.len(), 2);
    assert!(store.is_favorite(&Identity::new("web", "10.0.0.1")));
    assert!(store.is_favorite(&Identity::new("db", "10.0.0.5")));
}

#[test]
fn test_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let (store, warning) = FavoriteStore::load(temp_dir.path().join("favorites.yml"));
    assert!(store.is_empty());
    assert!(warning.is_some_and(|w| w.is_missing()));
}
