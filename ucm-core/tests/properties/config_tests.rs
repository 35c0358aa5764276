//! Property tests for connection loading and validation
//!
//! Covers validation completeness (k invalid records in a batch of N give
//! exactly k errors at the right positions and N-k usable connections) and
//! the save/load round trip through `ConfigManager`.

use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use ucm_core::{ConfigError, ConfigManager, Connection};

// ========== Generators ==========

/// What is wrong with a generated record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Defect {
    None,
    MissingAddress,
    MissingName,
    EmptyName,
    PortOutOfRange,
    PortNotNumber,
}

fn arb_defect() -> impl Strategy<Value = Defect> {
    prop_oneof![
        3 => Just(Defect::None),
        1 => Just(Defect::MissingAddress),
        1 => Just(Defect::MissingName),
        1 => Just(Defect::EmptyName),
        1 => Just(Defect::PortOutOfRange),
        1 => Just(Defect::PortNotNumber),
    ]
}

fn render_record(index: usize, defect: Defect) -> String {
    let name = format!("host{index}");
    let address = format!("10.0.{}.{}", index / 200, index % 200 + 1);
    match defect {
        Defect::None => format!("- name: {name}\n  address: {address}\n"),
        Defect::MissingAddress => format!("- name: {name}\n"),
        Defect::MissingName => format!("- address: {address}\n"),
        Defect::EmptyName => format!("- name: \"\"\n  address: {address}\n"),
        Defect::PortOutOfRange => {
            format!("- name: {name}\n  address: {address}\n  port: 70000\n")
        }
        Defect::PortNotNumber => format!("- name: {name}\n  address: {address}\n  port: abc\n"),
    }
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,15}"
}

fn arb_address() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{3,10}\\.[a-z]{2,4}",
        (1u8..=254, 0u8..=254, 1u8..=254).prop_map(|(a, b, c)| format!("10.{a}.{b}.{c}")),
    ]
}

fn arb_connection() -> impl Strategy<Value = Connection> {
    (
        arb_name(),
        arb_address(),
        prop::option::of("[a-z][a-z0-9_]{0,10}"),
        prop::option::of(1u16..=65535),
        prop::option::of("~/\\.ssh/[a-z]{3,8}"),
        prop::option::of("[a-z]{3,8}"),
    )
        .prop_map(|(name, address, user, port, identity_file, category)| {
            let mut conn = Connection::new(name, address);
            conn.user = user;
            conn.port = port;
            conn.identity_file = identity_file;
            conn.category = category;
            conn
        })
}

fn arb_unique_connections() -> impl Strategy<Value = Vec<Connection>> {
    prop::collection::vec(arb_connection(), 0..10).prop_map(|conns| {
        conns
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.name = format!("{}-{i}", c.name);
                c
            })
            .collect()
    })
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every invalid record yields exactly one error at its 1-based index
    #[test]
    fn prop_validation_is_complete(defects in prop::collection::vec(arb_defect(), 0..25)) {
        let content: String = defects
            .iter()
            .enumerate()
            .map(|(i, d)| render_record(i + 1, *d))
            .collect();

        let report = ConfigManager::parse_connections(&content, Path::new("test.yml")).unwrap();

        let expected_errors: Vec<usize> = defects
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != Defect::None)
            .map(|(i, _)| i + 1)
            .collect();
        let error_indices: Vec<usize> = report.errors.iter().map(|e| e.index).collect();
        prop_assert_eq!(&error_indices, &expected_errors);

        let expected_names: Vec<String> = defects
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == Defect::None)
            .map(|(i, _)| format!("host{}", i + 1))
            .collect();
        let names: Vec<String> = report.connections.iter().map(|c| c.name.clone()).collect();
        prop_assert_eq!(names, expected_names);
        prop_assert_eq!(report.connections.len() + report.errors.len(), defects.len());

        for error in &report.errors {
            prop_assert!(!error.problems.is_empty());
            let prefix = format!("Connection #{}", error.index);
            prop_assert!(error.to_string().starts_with(&prefix));
        }
    }

    /// Port values are accepted exactly in 1..=65535
    #[test]
    fn prop_port_range(port in 0i64..=70000) {
        let content = format!("- name: web\n  address: 10.0.0.1\n  port: {port}\n");
        let report = ConfigManager::parse_connections(&content, Path::new("test.yml")).unwrap();

        if (1..=65535).contains(&port) {
            prop_assert_eq!(report.connections.len(), 1);
            prop_assert_eq!(report.connections[0].port.map(i64::from), Some(port));
        } else {
            prop_assert_eq!(report.errors.len(), 1);
            prop_assert!(report.errors[0].problems[0].contains(&port.to_string()));
        }
    }

    /// Saved connections load back unchanged and in order
    #[test]
    fn prop_connections_round_trip(connections in arb_unique_connections()) {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());

        manager.save_connections(&connections).unwrap();
        let report = manager.load_connections().unwrap();

        prop_assert!(report.is_clean());
        prop_assert_eq!(report.connections, connections);
    }
}

// ========== Scenarios ==========

#[test]
fn test_missing_address_scenario() {
    let content = "- name: a\n  address: 1.1.1.1\n- name: b\n";
    let report = ConfigManager::parse_connections(content, Path::new("test.yml")).unwrap();

    assert_eq!(report.connections.len(), 1);
    assert_eq!(report.connections[0].name, "a");
    assert_eq!(report.errors.len(), 1);

    let message = report.errors[0].to_string();
    assert!(message.contains("#2"));
    assert!(message.contains("address"));
}

#[test]
fn test_unreadable_source_is_distinct() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());

    assert!(matches!(
        manager.load_connections(),
        Err(ConfigError::SourceUnreadable { .. })
    ));

    std::fs::write(manager.connections_path(), "name: [unclosed").unwrap();
    assert!(matches!(
        manager.load_connections(),
        Err(ConfigError::SourceUnreadable { .. })
    ));
}
