//! Property tests for the SSH connection list
//!
//! Covers the favorites-only predicate (exactly the favorited rows, in
//! original order), its AND composition with the filter buffer, recency
//! sorting, and history continuity across tracked and untracked renames.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;
use ucm_core::filter::{matches, CONNECTION_FIELDS};
use ucm_core::{
    ConfigManager, Connection, ConnectionListController, FavoriteStore, HistoryStore, SortPolicy,
};

// ========== Generators ==========

fn connections(count: usize) -> Vec<Connection> {
    (0..count)
        .map(|i| {
            let category = if i % 2 == 0 { "prod" } else { "dev" };
            Connection::new(format!("host{i}"), format!("10.0.0.{}", i + 1)).with_category(category)
        })
        .collect()
}

fn create_list(count: usize) -> ConnectionListController {
    ConnectionListController::new(
        connections(count),
        HistoryStore::default(),
        FavoriteStore::in_memory(),
    )
}

/// A row count and a favorite flag per row
fn arb_favorites() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..30)
}

fn names(list: &mut ConnectionListController) -> Vec<String> {
    list.rows().iter().map(|r| r.connection.name.clone()).collect()
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Favorites-only with an empty buffer shows exactly the favorites in file order
    #[test]
    fn prop_favorites_only_in_order(flags in arb_favorites()) {
        let mut list = create_list(flags.len());
        let all = connections(flags.len());
        for (conn, flag) in all.iter().zip(&flags) {
            if *flag {
                list.toggle_favorite(&conn.identity()).unwrap();
            }
        }
        list.set_filter("");
        list.set_favorites_only(true);

        let expected: Vec<String> = all
            .iter()
            .zip(&flags)
            .filter(|(_, flag)| **flag)
            .map(|(c, _)| c.name.clone())
            .collect();
        prop_assert_eq!(names(&mut list), expected);
    }

    /// Favorites-only and the filter compose with AND
    #[test]
    fn prop_predicates_compose(
        flags in arb_favorites(),
        buffer in prop::sample::select(vec!["prod", "dev", "host1", "10.0", ""]),
    ) {
        let mut list = create_list(flags.len());
        let all = connections(flags.len());
        for (conn, flag) in all.iter().zip(&flags) {
            if *flag {
                list.toggle_favorite(&conn.identity()).unwrap();
            }
        }
        list.set_favorites_only(true);
        list.set_filter(buffer);

        let expected: Vec<String> = all
            .iter()
            .zip(&flags)
            .filter(|(c, flag)| **flag && matches(buffer, &CONNECTION_FIELDS, *c))
            .map(|(c, _)| c.name.clone())
            .collect();
        prop_assert_eq!(names(&mut list), expected);
    }

    /// Recent sort puts used rows first by recency, then unused rows in file order
    #[test]
    fn prop_recent_sort(uses in prop::collection::vec((0usize..10, 0i64..1000), 0..30)) {
        let mut list = create_list(10);
        let all = connections(10);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (i, offset) in &uses {
            list.record_use(&all[*i], base + Duration::seconds(*offset)).unwrap();
        }
        list.set_sort(SortPolicy::Recent);

        let rows = list.rows().to_vec();
        prop_assert_eq!(rows.len(), 10);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].last_used() >= pair[1].last_used());
            if pair[0].last_used().is_none() {
                prop_assert!(pair[0].index < pair[1].index);
            }
        }
    }
}

// ========== Scenarios ==========

#[test]
fn test_five_rows_two_favorites() {
    let mut list = create_list(5);
    let all = connections(5);
    list.toggle_favorite(&all[3].identity()).unwrap();
    list.toggle_favorite(&all[1].identity()).unwrap();
    list.set_favorites_only(true);

    assert_eq!(names(&mut list), vec!["host1", "host3"]);
}

#[test]
fn test_tracked_rename_keeps_history_and_favorite() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
    manager.save_connections(&connections(3)).unwrap();

    let (mut list, report) = ConnectionListController::open(manager.clone(), 100);
    assert!(report.blocking_message().is_none());

    let original = connections(3)[1].clone();
    list.record_use(&original, Utc::now()).unwrap();
    list.toggle_favorite(&original.identity()).unwrap();

    let ticket = list.begin_edit(&original.identity()).unwrap();
    let mut updated = ticket.draft().clone();
    updated.name = "renamed".to_string();
    list.commit_edit(ticket, updated.clone()).unwrap();

    // Reopen from disk: everything follows the new identity
    let (mut reopened, _) = ConnectionListController::open(manager, 100);
    let row = reopened
        .rows()
        .iter()
        .find(|r| r.connection.name == "renamed")
        .cloned()
        .unwrap();
    assert!(row.favorite);
    assert_eq!(row.use_count(), 1);
    assert_eq!(reopened.most_recent(), Some(&updated));
}

#[test]
fn test_untracked_rename_orphans_history() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
    manager.save_connections(&connections(2)).unwrap();

    let (mut list, _) = ConnectionListController::open(manager.clone(), 100);
    list.record_use(&connections(2)[0], Utc::now()).unwrap();

    // Hand edit: rename host0 without going through the edit path
    let mut edited = connections(2);
    edited[0].name = "hand-renamed".to_string();
    manager.save_connections(&edited).unwrap();

    let (mut reopened, _) = ConnectionListController::open(manager, 100);
    assert!(reopened.most_recent().is_none());
    assert!(reopened.rows().iter().all(|r| r.history.is_none()));
    assert_eq!(reopened.history().len(), 1);
}
