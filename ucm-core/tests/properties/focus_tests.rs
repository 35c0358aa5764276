//! Property tests for focus cycling
//!
//! Covers cycle coverage (C forward moves from any region visit every region
//! once and return to the start) and in-place target replacement.

use proptest::prelude::*;
use std::collections::HashSet;
use ucm_core::{Direction, FocusController, FocusError};

// ========== Generators ==========

/// Distinct region names with arbitrary order hints
fn arb_regions() -> impl Strategy<Value = Vec<(String, i32)>> {
    prop::collection::hash_set("[a-z]{1,8}", 1..10).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let count = names.len();
        (Just(names), prop::collection::vec(-50i32..50, count))
            .prop_map(|(names, orders)| names.into_iter().zip(orders).collect())
    })
}

fn build(regions: &[(String, i32)]) -> FocusController<usize> {
    let mut focus = FocusController::new();
    for (i, (name, order)) in regions.iter().enumerate() {
        focus.register_or_replace(name.clone(), *order, i);
    }
    focus
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// C forward moves visit every region once and return to the start
    #[test]
    fn prop_forward_cycle_covers_all(regions in arb_regions(), start in 0usize..10) {
        let mut focus = build(&regions);
        let count = focus.len();
        let start_name = regions[start % count].0.clone();
        focus.focus(&start_name).unwrap();

        let mut visited = HashSet::new();
        for _ in 0..count {
            let change = focus.advance(Direction::Forward).unwrap();
            prop_assert!(visited.insert(change.to.clone()));
        }

        prop_assert_eq!(visited.len(), count);
        prop_assert_eq!(focus.current_name(), Some(start_name.as_str()));
    }

    /// Backward undoes forward
    #[test]
    fn prop_backward_undoes_forward(regions in arb_regions(), steps in 0usize..20) {
        let mut focus = build(&regions);
        let start = focus.current_name().map(str::to_string);

        for _ in 0..steps {
            focus.advance(Direction::Forward).unwrap();
        }
        for _ in 0..steps {
            focus.advance(Direction::Backward).unwrap();
        }
        prop_assert_eq!(focus.current_name().map(str::to_string), start);
    }

    /// Cycle order follows order hints; equal hints keep registration order
    #[test]
    fn prop_cycle_ordered_by_hint(regions in arb_regions()) {
        let focus = build(&regions);
        let names: Vec<&str> = focus.names().collect();

        let mut expected: Vec<(i32, usize, &str)> = regions
            .iter()
            .enumerate()
            .map(|(i, (name, order))| (*order, i, name.as_str()))
            .collect();
        expected.sort_unstable();
        let expected: Vec<&str> = expected.into_iter().map(|(_, _, name)| name).collect();
        prop_assert_eq!(names, expected);
    }

    /// Replacing a target keeps the cycle and the current focus unchanged
    #[test]
    fn prop_replace_keeps_position(regions in arb_regions(), pick in 0usize..10, moves in 0usize..10) {
        let mut focus = build(&regions);
        for _ in 0..moves {
            focus.advance(Direction::Forward).unwrap();
        }
        let names_before: Vec<String> = focus.names().map(str::to_string).collect();
        let current_before = focus.current_name().map(str::to_string);

        let (name, _) = &regions[pick % regions.len()];
        let old = focus.register_or_replace(name.clone(), 1000, 999);

        prop_assert_eq!(old, Some(pick % regions.len()));
        prop_assert_eq!(focus.get(name), Some(&999));
        let names_after: Vec<String> = focus.names().map(str::to_string).collect();
        prop_assert_eq!(names_after, names_before);
        prop_assert_eq!(focus.current_name().map(str::to_string), current_before);
    }
}

// ========== Scenarios ==========

#[test]
fn test_first_registered_has_focus() {
    let mut focus = FocusController::new();
    focus.register_or_replace("list", 10, "list");
    focus.register_or_replace("tabs", 0, "tabs");
    assert_eq!(focus.current(), Some(&"list"));
}

#[test]
fn test_empty_cycle_is_an_error() {
    let mut focus: FocusController<()> = FocusController::new();
    assert!(matches!(
        focus.advance(Direction::Forward),
        Err(FocusError::NoRegions)
    ));
    assert!(matches!(
        focus.focus("list"),
        Err(FocusError::UnknownRegion(_))
    ));
}
