//! Property-based tests for fingerprinting, interning, and exploration
//!
//! These tests verify the algebraic laws the checker's correctness rests on
//! using proptest: canonical fingerprints, exactly-once interning, and
//! BFS shortest-counterexample guarantees across randomized inputs.

use proptest::prelude::*;
use std::collections::HashMap;
use veristate::{
    Checker, FnAction, Model, RunConfig, RunStatus, State, StateStore, Value,
};

// ============================================================================
// Helper functions and strategies
// ============================================================================

fn counter_state(x: i64) -> State {
    State::from_pairs([("x", Value::int(x))])
}

/// A bounded counter: `inc` until `limit`, `reset` back to zero.
fn counter_model(limit: i64) -> Model {
    Model::new()
        .init(counter_state(0))
        .action(FnAction::simple("inc", move |s: &State| {
            let x = s.get_int("x").unwrap();
            if x < limit {
                vec![s.with_var("x", Value::int(x + 1))]
            } else {
                vec![]
            }
        }))
        .action(FnAction::simple("reset", |s: &State| {
            if s.get_int("x").unwrap() > 0 {
                vec![s.with_var("x", Value::int(0))]
            } else {
                vec![]
            }
        }))
}

/// Non-empty maps of distinct variable names to integer values.
fn var_map() -> impl Strategy<Value = HashMap<String, i64>> {
    prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 1..8)
}

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::int),
        "[a-zA-Z0-9]{0,12}".prop_map(Value::str),
    ]
}

// ============================================================================
// Fingerprint canonicality
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Insertion order never affects a state's fingerprint.
    #[test]
    fn prop_fingerprint_order_independent(vars in var_map()) {
        let pairs: Vec<(String, Value)> = vars
            .iter()
            .map(|(k, &v)| (k.clone(), Value::int(v)))
            .collect();
        let mut reversed = pairs.clone();
        reversed.reverse();

        let a = State::from_pairs(pairs);
        let b = State::from_pairs(reversed);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
    }

    /// Changing any single variable's value changes the fingerprint.
    #[test]
    fn prop_fingerprint_tracks_content(vars in var_map(), delta in 1..1000i64) {
        let base = State::from_pairs(
            vars.iter().map(|(k, &v)| (k.clone(), Value::int(v))),
        );
        for (name, &v) in &vars {
            let changed = base.with_var(name.clone(), Value::int(v.wrapping_add(delta)));
            prop_assert_ne!(base.fingerprint(), changed.fingerprint());
        }
    }

    /// Set values are canonical: element order and duplication are invisible.
    #[test]
    fn prop_set_is_canonical(mut elems in prop::collection::vec(any::<i64>(), 1..16)) {
        let forward = Value::set(elems.iter().map(|&v| Value::int(v)));
        elems.reverse();
        let mut doubled: Vec<i64> = elems.clone();
        doubled.extend_from_slice(&elems);
        let backward = Value::set(doubled.iter().map(|&v| Value::int(v)));

        prop_assert_eq!(&forward, &backward);
        let a = State::from_pairs([("s", forward)]);
        let b = State::from_pairs([("s", backward)]);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
    }

    /// Sequences are positional: reversing a non-palindromic sequence
    /// changes the state.
    #[test]
    fn prop_seq_is_positional(elems in prop::collection::vec(any::<i64>(), 2..16)) {
        let mut reversed = elems.clone();
        reversed.reverse();
        prop_assume!(elems != reversed);

        let a = State::from_pairs([("q", Value::seq(elems.iter().map(|&v| Value::int(v))))]);
        let b = State::from_pairs([("q", Value::seq(reversed.iter().map(|&v| Value::int(v))))]);
        prop_assert_ne!(&a, &b);
        prop_assert_ne!(a.fingerprint(), b.fingerprint());
    }

    /// The same scalar stored under different variable names is a different
    /// state.
    #[test]
    fn prop_variable_names_are_identity(v in scalar_value()) {
        let a = State::from_pairs([("x", v.clone())]);
        let b = State::from_pairs([("y", v)]);
        prop_assert_ne!(a.fingerprint(), b.fingerprint());
    }
}

// ============================================================================
// Interning laws
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Interning is idempotent: equal content yields the same dense id, and
    /// only the first call reports `is_new`.
    #[test]
    fn prop_intern_idempotent(values in prop::collection::vec(any::<i64>(), 1..32)) {
        let store = StateStore::new(10_000);
        let mut seen: HashMap<i64, veristate::StateId> = HashMap::new();

        for &v in &values {
            let (id, is_new) = store.intern(counter_state(v)).unwrap();
            match seen.get(&v) {
                Some(&prev) => {
                    prop_assert!(!is_new);
                    prop_assert_eq!(id, prev);
                }
                None => {
                    prop_assert!(is_new);
                    prop_assert_eq!(id.as_usize(), seen.len());
                    seen.insert(v, id);
                }
            }
        }
        prop_assert_eq!(store.len(), seen.len());
    }
}

// ============================================================================
// Exploration laws
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A violation at depth k comes back as a trace of exactly k+1 states:
    /// BFS counterexamples are shortest.
    #[test]
    fn prop_counterexample_is_shortest(k in 1..8i64, extra in 0..8i64) {
        let model = counter_model(k + extra)
            .invariant("below", move |s| s.get_int("x").unwrap() < k);
        let result = Checker::new(&model).run(&RunConfig::default()).unwrap();

        prop_assert_eq!(result.status, RunStatus::InvariantViolation);
        let trace = result.trace.unwrap();
        prop_assert_eq!(trace.len() as i64, k + 1);
        prop_assert_eq!(trace.steps.last().unwrap().state.get_int("x"), Some(k));
    }

    /// Runs are reproducible: identical model and config give identical
    /// statistics and identical traces.
    #[test]
    fn prop_runs_are_deterministic(k in 1..8i64) {
        let make = || counter_model(8).invariant("below", move |s| s.get_int("x").unwrap() < k);
        let a = Checker::new(&make()).run(&RunConfig::default()).unwrap();
        let b = Checker::new(&make()).run(&RunConfig::default()).unwrap();

        prop_assert_eq!(a.status, b.status);
        prop_assert_eq!(a.states_explored, b.states_explored);
        prop_assert_eq!(a.distinct_states, b.distinct_states);
        let (ta, tb) = (a.trace.unwrap(), b.trace.unwrap());
        prop_assert_eq!(ta.len(), tb.len());
        for (sa, sb) in ta.steps.iter().zip(tb.steps.iter()) {
            prop_assert_eq!(&sa.state, &sb.state);
            prop_assert_eq!(&sa.action, &sb.action);
        }
    }

    /// Distinct-state counts are exact: a bounded counter has precisely
    /// `limit + 1` reachable states, in any execution mode.
    #[test]
    fn prop_state_counts_exact(limit in 1..40i64, workers in 0..4usize) {
        let model = counter_model(limit);
        let result = Checker::new(&model)
            .run(&RunConfig::default().with_workers(workers))
            .unwrap();
        prop_assert_eq!(result.status, RunStatus::Success);
        prop_assert_eq!(result.distinct_states as i64, limit + 1);
    }
}
