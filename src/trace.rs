//! Counterexample traces
//!
//! A trace is reconstructed purely from recorded transition edges: the
//! finite prefix follows parent pointers backward from the violating state
//! to an init state, and — for liveness violations only — a cyclic suffix
//! repeats one full traversal of the violating SCC. No step is ever
//! fabricated.

use crate::graph::StateGraph;
use crate::state::State;
use crate::store::{StateId, StateStore};
use std::fmt;
use std::sync::Arc;

/// One step of a counterexample: the state reached and the action instance
/// that led into it (`None` for the initial state).
#[derive(Clone, Debug)]
pub struct TraceStep {
    pub state: State,
    pub action: Option<Arc<str>>,
}

/// An ordered counterexample path, plus a repeating suffix for liveness
/// violations.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    /// Finite prefix from an init state to the violating state (or to the
    /// cycle entry, for liveness).
    pub steps: Vec<TraceStep>,
    /// Repeating suffix: one full cyclic traversal, ending where it started.
    /// Empty for safety violations.
    pub cycle: Vec<TraceStep>,
}

impl Trace {
    /// Follow parent pointers backward from `target` to an init state.
    ///
    /// BFS discovery order guarantees this is a shortest path.
    pub fn prefix_to(graph: &StateGraph, store: &StateStore, target: StateId) -> Trace {
        let mut steps = Vec::new();
        let mut current = target;
        loop {
            let node = graph.node(current);
            match &node.parent {
                Some(parent) => {
                    steps.push(TraceStep {
                        state: store.get(current),
                        action: Some(parent.label.clone()),
                    });
                    current = parent.source;
                }
                None => {
                    steps.push(TraceStep {
                        state: store.get(current),
                        action: None,
                    });
                    break;
                }
            }
        }
        steps.reverse();
        Trace {
            steps,
            cycle: Vec::new(),
        }
    }

    /// Attach a cyclic suffix built from `(state, inbound_action)` ids.
    pub fn with_cycle(
        mut self,
        store: &StateStore,
        cycle: impl IntoIterator<Item = (StateId, Arc<str>)>,
    ) -> Trace {
        self.cycle = cycle
            .into_iter()
            .map(|(id, label)| TraceStep {
                state: store.get(id),
                action: Some(label),
            })
            .collect();
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether this is a lasso (liveness counterexample).
    pub fn has_cycle(&self) -> bool {
        !self.cycle.is_empty()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match &step.action {
                Some(action) => writeln!(f, "State {} [{}]: {}", i + 1, action, step.state)?,
                None => writeln!(f, "State {} [initial]: {}", i + 1, step.state)?,
            }
        }
        if !self.cycle.is_empty() {
            writeln!(f, "-- repeating cycle --")?;
            for step in &self.cycle {
                let action = step.action.as_deref().unwrap_or("?");
                writeln!(f, "  [{}] {}", action, step.state)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Parent;
    use crate::value::Value;

    fn st(x: i64) -> State {
        State::from_pairs([("x", Value::int(x))])
    }

    #[test]
    fn prefix_follows_parents_to_init() {
        let store = StateStore::new(10);
        let mut graph = StateGraph::new(1);

        let (s0, _) = store.intern(st(0)).unwrap();
        graph.push_node(s0, None, 0);
        graph.mark_init(s0);

        let (s1, _) = store.intern(st(1)).unwrap();
        graph.push_node(
            s1,
            Some(Parent {
                source: s0,
                label: Arc::from("inc"),
            }),
            1,
        );

        let (s2, _) = store.intern(st(2)).unwrap();
        graph.push_node(
            s2,
            Some(Parent {
                source: s1,
                label: Arc::from("inc"),
            }),
            2,
        );

        let trace = Trace::prefix_to(&graph, &store, s2);
        assert_eq!(trace.len(), 3);
        assert!(trace.steps[0].action.is_none());
        assert_eq!(trace.steps[0].state, st(0));
        assert_eq!(trace.steps[2].state, st(2));
        assert_eq!(trace.steps[2].action.as_deref(), Some("inc"));
        assert!(!trace.has_cycle());
    }

    #[test]
    fn cycle_suffix_attaches() {
        let store = StateStore::new(10);
        let mut graph = StateGraph::new(1);
        let (s0, _) = store.intern(st(0)).unwrap();
        graph.push_node(s0, None, 0);
        graph.mark_init(s0);

        let trace = Trace::prefix_to(&graph, &store, s0)
            .with_cycle(&store, [(s0, Arc::from("stutter"))]);
        assert!(trace.has_cycle());
        assert_eq!(trace.cycle.len(), 1);
        assert_eq!(trace.cycle[0].state, st(0));
    }
}
