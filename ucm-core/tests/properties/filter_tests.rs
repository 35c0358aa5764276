//! Property tests for filtering
//!
//! Covers matching correctness against a direct case-folded substring
//! oracle, and command/filter disambiguation in the filter state machine.

use proptest::prelude::*;
use ucm_core::filter::{filter_indices, matches, CONNECTION_FIELDS};
use ucm_core::{Connection, FilterEngine, FilterMode, FilterResponse, Key};

// ========== Generators ==========

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9.-]{1,12}"
}

fn arb_connection() -> impl Strategy<Value = Connection> {
    (
        arb_text(),
        arb_text(),
        prop::option::of(arb_text()),
        prop::option::of(arb_text()),
    )
        .prop_map(|(name, address, user, category)| {
            let mut conn = Connection::new(name, address);
            conn.user = user;
            conn.category = category;
            conn
        })
}

fn arb_buffer() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-zA-Z0-9.-]{1,3}"]
}

/// Single-character keys bound to commands in either view
fn arb_command_key() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['c', 'f', 'F', 'r', 'L', 'i', 'q', 'S', 's', 'R', 'D', 'l', 'a', '?'])
}

fn oracle(buffer: &str, conn: &Connection) -> bool {
    let needle = buffer.to_lowercase();
    [
        Some(conn.name.as_str()),
        Some(conn.address.as_str()),
        conn.user.as_deref(),
        conn.category.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|value| value.to_lowercase().contains(&needle))
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The matched subset equals the substring oracle; "" matches all
    #[test]
    fn prop_filter_matches_oracle(
        rows in prop::collection::vec(arb_connection(), 0..30),
        buffer in arb_buffer(),
    ) {
        let matched = filter_indices(&rows, &buffer, &CONNECTION_FIELDS);
        let expected: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| oracle(&buffer, r))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(&matched, &expected);

        if buffer.is_empty() {
            prop_assert_eq!(matched.len(), rows.len());
        }
    }

    /// Matching ignores case on both sides
    #[test]
    fn prop_matching_is_case_insensitive(conn in arb_connection(), buffer in arb_buffer()) {
        prop_assert_eq!(
            matches(&buffer.to_uppercase(), &CONNECTION_FIELDS, &conn),
            matches(&buffer.to_lowercase(), &CONNECTION_FIELDS, &conn)
        );
    }

    /// While inactive, command keys never touch the buffer
    #[test]
    fn prop_inactive_keys_are_commands(
        prefix in "[a-z]{0,5}",
        keys in prop::collection::vec(arb_command_key(), 1..20),
    ) {
        let mut engine = FilterEngine::new(&CONNECTION_FIELDS);
        engine.activate();
        for c in prefix.chars() {
            engine.handle_key(Key::Char(c));
        }
        engine.deactivate();

        for c in keys {
            prop_assert_eq!(engine.handle_key(Key::Char(c)), FilterResponse::Ignored);
            prop_assert_eq!(engine.buffer(), prefix.as_str());
            prop_assert_eq!(engine.mode(), FilterMode::Inactive);
        }
    }

    /// While active, the same keys only edit the buffer
    #[test]
    fn prop_active_keys_edit_buffer(keys in prop::collection::vec(arb_command_key(), 1..20)) {
        let mut engine = FilterEngine::new(&CONNECTION_FIELDS);
        prop_assert_eq!(engine.handle_key(FilterEngine::ACTIVATION_KEY), FilterResponse::Activated);

        let mut expected = String::new();
        for c in keys {
            prop_assert_eq!(engine.handle_key(Key::Char(c)), FilterResponse::BufferChanged);
            expected.push(c);
            prop_assert_eq!(engine.buffer(), expected.as_str());
        }
        prop_assert!(engine.is_active());
    }

    /// Deactivation keeps the buffer; re-activation resumes it
    #[test]
    fn prop_buffer_survives_deactivation(text in "[a-z0-9]{0,10}") {
        let mut engine = FilterEngine::default();
        engine.handle_key(Key::Char('/'));
        for c in text.chars() {
            engine.handle_key(Key::Char(c));
        }

        prop_assert_eq!(engine.handle_key(Key::Esc), FilterResponse::Deactivated);
        prop_assert_eq!(engine.buffer(), text.as_str());

        engine.handle_key(Key::Char('/'));
        prop_assert!(engine.is_active());
        prop_assert_eq!(engine.buffer(), text.as_str());
    }
}

// ========== Scenarios ==========

#[test]
fn test_prod_scenario() {
    let rows = vec![
        Connection::new("prod-web", "10.0.0.1"),
        Connection::new("dev-web", "10.0.1.1"),
    ];
    assert_eq!(filter_indices(&rows, "prod", &CONNECTION_FIELDS), vec![0]);
}

#[test]
fn test_backspace_and_clear() {
    let mut engine = FilterEngine::default();
    engine.handle_key(Key::Char('/'));
    engine.handle_key(Key::Char('a'));
    engine.handle_key(Key::Char('b'));

    assert_eq!(engine.handle_key(Key::Backspace), FilterResponse::BufferChanged);
    assert_eq!(engine.buffer(), "a");
    assert_eq!(engine.handle_key(Key::Ctrl('u')), FilterResponse::BufferChanged);
    assert_eq!(engine.buffer(), "");
    assert_eq!(engine.handle_key(Key::Backspace), FilterResponse::Consumed);
}
