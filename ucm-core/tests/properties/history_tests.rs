//! Property tests for the bounded usage history
//!
//! Covers the eviction rule (inserting past the cap evicts exactly the entry
//! with the oldest `last_used`), the capacity invariant under arbitrary
//! insert/update sequences, and persistence through a temp directory.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;
use ucm_core::store::DEFAULT_MAX_ENTRIES;
use ucm_core::{HistoryStore, Identity, PersistenceWarning};

// ========== Generators ==========

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn identity(n: usize) -> Identity {
    Identity::new(format!("host{n}"), format!("10.0.{}.{}", n / 200, n % 200 + 1))
}

/// Distinct offsets in seconds, one per identity, in random order
fn arb_distinct_offsets(count: usize) -> impl Strategy<Value = Vec<i64>> {
    Just((0..count as i64).collect::<Vec<_>>()).prop_shuffle()
}

/// A sequence of (identity number, offset) uses
fn arb_uses() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0usize..150, 0i64..10_000), 0..400)
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The 101st distinct identity evicts exactly the oldest entry
    #[test]
    fn prop_eviction_removes_oldest(offsets in arb_distinct_offsets(DEFAULT_MAX_ENTRIES)) {
        let mut store = HistoryStore::in_memory(DEFAULT_MAX_ENTRIES);
        for (n, offset) in offsets.iter().enumerate() {
            store.record_use(&identity(n), base_time() + Duration::seconds(*offset));
        }
        prop_assert_eq!(store.len(), DEFAULT_MAX_ENTRIES);

        let oldest = offsets.iter().position(|o| *o == 0).unwrap();
        store.record_use(&identity(1000), base_time() + Duration::days(1));

        prop_assert_eq!(store.len(), DEFAULT_MAX_ENTRIES);
        prop_assert!(store.get(&identity(oldest)).is_none());
        for n in (0..DEFAULT_MAX_ENTRIES).filter(|n| *n != oldest) {
            prop_assert!(store.get(&identity(n)).is_some());
        }
        prop_assert!(store.get(&identity(1000)).is_some());
    }

    /// The store never exceeds its capacity
    #[test]
    fn prop_capacity_never_exceeded(uses in arb_uses(), cap in 1usize..=DEFAULT_MAX_ENTRIES) {
        let mut store = HistoryStore::in_memory(cap);
        for (n, offset) in uses {
            store.record_use(&identity(n), base_time() + Duration::seconds(offset));
            prop_assert!(store.len() <= cap);
        }
    }

    /// Updating an existing identity never evicts anything
    #[test]
    fn prop_update_never_evicts(picks in prop::collection::vec(0usize..DEFAULT_MAX_ENTRIES, 1..50)) {
        let mut store = HistoryStore::in_memory(DEFAULT_MAX_ENTRIES);
        for n in 0..DEFAULT_MAX_ENTRIES {
            store.record_use(&identity(n), base_time() + Duration::seconds(n as i64));
        }

        for (step, n) in picks.iter().enumerate() {
            store.record_use(&identity(*n), base_time() + Duration::hours(1 + step as i64));
            prop_assert_eq!(store.len(), DEFAULT_MAX_ENTRIES);
        }
        for n in 0..DEFAULT_MAX_ENTRIES {
            prop_assert!(store.get(&identity(n)).is_some());
        }
    }

    /// use_count counts uses and last_used is the latest timestamp
    #[test]
    fn prop_record_use_accumulates(offsets in prop::collection::vec(0i64..100_000, 1..20)) {
        let mut store = HistoryStore::default();
        let id = identity(1);
        for offset in &offsets {
            store.record_use(&id, base_time() + Duration::seconds(*offset));
        }

        let entry = store.get(&id).unwrap();
        prop_assert_eq!(entry.use_count as usize, offsets.len());
        let latest = offsets.iter().max().copied().unwrap();
        prop_assert_eq!(entry.last_used, base_time() + Duration::seconds(latest));
    }

    /// most_recent is the identity with the greatest last_used
    #[test]
    fn prop_most_recent(offsets in arb_distinct_offsets(20)) {
        let mut store = HistoryStore::default();
        for (n, offset) in offsets.iter().enumerate() {
            store.record_use(&identity(n), base_time() + Duration::seconds(*offset));
        }

        let newest = offsets.iter().position(|o| *o == 19).unwrap();
        prop_assert_eq!(store.most_recent(), Some(identity(newest)));
    }

    /// History survives a save/load cycle
    #[test]
    fn prop_history_round_trip(uses in arb_uses()) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.yml");

        let (mut store, _) = HistoryStore::load(&path, DEFAULT_MAX_ENTRIES);
        for (n, offset) in uses {
            store.record_use(&identity(n), base_time() + Duration::seconds(offset));
        }
        store.save().unwrap();

        let (loaded, warning) = HistoryStore::load(&path, DEFAULT_MAX_ENTRIES);
        prop_assert!(warning.is_none());
        prop_assert_eq!(loaded.entries(), store.entries());
    }
}

// ========== Scenarios ==========

#[test]
fn test_three_uses_scenario() {
    let mut store = HistoryStore::default();
    let a = Identity::new("a", "1.1.1.1");
    for i in 1..=3 {
        store.record_use(&a, base_time() + Duration::minutes(i));
    }

    let entry = store.get(&a).unwrap();
    assert_eq!(entry.use_count, 3);
    assert_eq!(entry.last_used, base_time() + Duration::minutes(3));
}

#[test]
fn test_corrupt_store_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.yml");
    std::fs::write(&path, "name: [unclosed").unwrap();

    let (store, warning) = HistoryStore::load(&path, DEFAULT_MAX_ENTRIES);
    assert!(store.is_empty());
    assert!(matches!(warning, Some(PersistenceWarning::Corrupt { .. })));

    let (store, warning) = HistoryStore::load(temp_dir.path().join("missing.yml"), 10);
    assert!(store.is_empty());
    assert!(warning.is_some_and(|w| w.is_missing()));
}
