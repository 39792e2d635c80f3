//! Property-based tests for prefire classification invariants.

use pf_common::{AcceptEvent, AcceptRecord};
use pf_core::prefire::{classify, classify_record, AcceptHistory, Diagnostic, TRIGGER_RULES};
use proptest::prelude::*;

fn verdict(distances: &[u64]) -> pf_core::prefire::Classification {
    classify(&AcceptHistory::from_distances(distances.to_vec()))
}

/// Distances in the range where the rule windows matter.
fn distance() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..=260, Just(3u64), Just(25u64), Just(100u64), Just(240u64)]
}

// ============================================================================
// Reference histories
// ============================================================================

#[test]
fn first_rule_fires_on_a_three_crossing_gap() {
    let v = verdict(&[3, 50, 150, 300]);
    assert!(v.unprefirable);
    assert_eq!(v.fired_rule, Some(TRIGGER_RULES[0]));
    assert!(v.diagnostics.is_empty());
}

#[test]
fn second_rule_needs_the_exact_window_edge() {
    let fired = verdict(&[10, 25, 150, 300]);
    assert!(fired.unprefirable);
    assert_eq!(fired.fired_rule, Some(TRIGGER_RULES[1]));

    let clear = verdict(&[10, 20, 150, 300]);
    assert!(!clear.unprefirable);
    assert_eq!(clear.fired_rule, None);
}

#[test]
fn raw_record_matches_distances() {
    let record = AcceptRecord::from_distances(AcceptEvent::new(1001, 100), &[10, 25, 150, 300]);
    let v = classify_record(&record);
    assert!(v.unprefirable);
    assert_eq!(v.fired_rule, Some(TRIGGER_RULES[1]));
}

#[test]
fn accept_after_current_crossing_is_reported() {
    let current = AcceptEvent::new(100, 10);
    let record = AcceptRecord::new(
        current,
        vec![
            AcceptEvent::new(200, 10),
            AcceptEvent::new(50, 10),
            AcceptEvent::new(40, 10),
            AcceptEvent::new(30, 10),
        ],
    );
    let v = classify_record(&record);
    assert!(v
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::FutureAccept { index: 0 })));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Only the four most recent accepts decide the verdict.
    #[test]
    fn verdict_ignores_older_accepts(
        head in prop::collection::vec(distance(), 4),
        tail in prop::collection::vec(0u64..100_000, 0..12),
    ) {
        let mut full = head.clone();
        full.extend(tail);
        let a = verdict(&head);
        let b = verdict(&full);
        prop_assert_eq!(a.unprefirable, b.unprefirable);
        prop_assert_eq!(a.fired_rule, b.fired_rule);
    }

    /// A fired rule always sits exactly on its window edge.
    #[test]
    fn fired_rule_is_saturated(distances in prop::collection::vec(distance(), 4..8)) {
        let v = verdict(&distances);
        prop_assert_eq!(v.unprefirable, v.fired_rule.is_some());
        if let Some(rule) = v.fired_rule {
            prop_assert_eq!(distances[rule.max_accepts - 1], rule.window);
        }
    }

    /// Accepts far outside every window never make an event unprefirable.
    #[test]
    fn distant_history_is_prefirable(distances in prop::collection::vec(241u64..1_000_000, 4..8)) {
        let v = verdict(&distances);
        prop_assert!(!v.unprefirable);
    }

    /// Short histories are flagged but still classified.
    #[test]
    fn short_history_is_diagnosed(distances in prop::collection::vec(distance(), 0..4)) {
        let v = verdict(&distances);
        let depth = distances.len();
        let expected = Diagnostic::ShortHistory { depth };
        prop_assert!(v.diagnostics.contains(&expected));
    }
}
