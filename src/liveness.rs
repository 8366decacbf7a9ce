//! Liveness checking: fairness-filtered SCC analysis
//!
//! After BFS has accumulated the full reachable graph, temporal properties
//! are checked against its cycles. A candidate infinite behavior is a
//! non-trivial strongly connected component (more than one state, or a
//! single state with a self-loop), found with an iterative Tarjan pass over
//! the arena-indexed adjacency lists.
//!
//! # Fairness
//!
//! A cycle that starves an action the model declared fair is not a real
//! behavior and must not witness a violation. For each action with a
//! fairness assumption:
//!
//! - weak: enabled on *every* state of the SCC means some transition inside
//!   the SCC must be that action, otherwise the SCC is unfair and excluded;
//! - strong: enabled on *at least one* state of the SCC (hence infinitely
//!   often along any cyclic traversal) triggers the same requirement.
//!
//! # Counterexamples
//!
//! A violation is reported as a lasso: the shortest prefix from an init
//! state to the violating SCC plus one full cyclic traversal, tie-broken at
//! every step by preferring the lowest `StateId` so repeated runs reproduce
//! the same trace byte for byte.

use crate::graph::StateGraph;
use crate::model::{Fairness, Model, Pred, Temporal};
use crate::store::{StateId, StateStore};
use crate::trace::{Trace, TraceStep};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// A violated property together with its lasso counterexample.
pub(crate) struct LivenessOutcome {
    pub property: Arc<str>,
    pub trace: Trace,
}

/// Check every property in declaration order; report the first violation.
pub(crate) fn check(
    model: &Model,
    graph: &StateGraph,
    store: &StateStore,
) -> Option<LivenessOutcome> {
    if model.properties.is_empty() {
        return None;
    }

    let (comp_of, comps) = tarjan(graph);
    debug!(sccs = comps.len(), "liveness: SCC decomposition complete");

    // Fairness is a property of the graph, not of any particular formula:
    // compute the fair/unfair verdict per SCC once.
    let fair: Vec<bool> = comps
        .iter()
        .enumerate()
        .map(|(ci, comp)| scc_is_fair(model, graph, comp, &comp_of, ci))
        .collect();

    for property in &model.properties {
        let violation = match &property.temporal {
            Temporal::AlwaysEventually(p) => {
                check_always_eventually(graph, store, &comps, &comp_of, &fair, p)
            }
            Temporal::EventuallyAlways(p) => {
                check_eventually_always(graph, store, &comps, &comp_of, &fair, p)
            }
            Temporal::Eventually(p) => {
                check_eventually(graph, store, &comps, &comp_of, &fair, p)
            }
            Temporal::LeadsTo(p, q) => {
                check_leads_to(graph, store, &comps, &comp_of, &fair, p, q)
            }
        };
        if let Some(trace) = violation {
            return Some(LivenessOutcome {
                property: property.name().clone(),
                trace,
            });
        }
    }
    None
}

// ============================================================================
// SCC decomposition
// ============================================================================

/// Iterative Tarjan over the whole arena.
///
/// Returns the component index per state and the components themselves, each
/// sorted by id.
fn tarjan(graph: &StateGraph) -> (Vec<usize>, Vec<Vec<StateId>>) {
    let n = graph.len();
    const UNVISITED: u32 = u32::MAX;

    let mut index = vec![UNVISITED; n];
    let mut low = vec![0u32; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<u32> = Vec::new();
    let mut comp_of = vec![usize::MAX; n];
    let mut comps: Vec<Vec<StateId>> = Vec::new();
    let mut next_index = 0u32;
    // Explicit call stack: (node, next edge offset).
    let mut call: Vec<(u32, usize)> = Vec::new();

    for root in 0..n as u32 {
        if index[root as usize] != UNVISITED {
            continue;
        }
        index[root as usize] = next_index;
        low[root as usize] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root as usize] = true;
        call.push((root, 0));

        while let Some(frame) = call.last_mut() {
            let v = frame.0;
            let edges = graph.edges(StateId(v));
            if frame.1 < edges.len() {
                let w = edges[frame.1].target.0;
                frame.1 += 1;
                if index[w as usize] == UNVISITED {
                    index[w as usize] = next_index;
                    low[w as usize] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w as usize] = true;
                    call.push((w, 0));
                } else if on_stack[w as usize] {
                    low[v as usize] = low[v as usize].min(index[w as usize]);
                }
            } else {
                call.pop();
                if let Some(parent) = call.last() {
                    let p = parent.0 as usize;
                    low[p] = low[p].min(low[v as usize]);
                }
                if low[v as usize] == index[v as usize] {
                    let mut comp = Vec::new();
                    loop {
                        let w = stack.pop().expect("tarjan stack underflow");
                        on_stack[w as usize] = false;
                        comp_of[w as usize] = comps.len();
                        comp.push(StateId(w));
                        if w == v {
                            break;
                        }
                    }
                    comp.sort();
                    comps.push(comp);
                }
            }
        }
    }

    (comp_of, comps)
}

/// Non-trivial: a candidate for infinite behavior.
fn non_trivial(graph: &StateGraph, comp: &[StateId]) -> bool {
    comp.len() > 1 || graph.has_self_loop(comp[0])
}

// ============================================================================
// Fairness
// ============================================================================

fn scc_is_fair(
    model: &Model,
    graph: &StateGraph,
    comp: &[StateId],
    comp_of: &[usize],
    comp_idx: usize,
) -> bool {
    for (idx, action) in model.actions.iter().enumerate() {
        let fairness = action.fairness();
        if fairness == Fairness::Unfair {
            continue;
        }
        let a = idx as u16;
        let enabled_count = comp
            .iter()
            .filter(|&&id| graph.is_enabled(id, a))
            .count();
        let triggered = match fairness {
            Fairness::Weak => enabled_count == comp.len(),
            Fairness::Strong => enabled_count > 0,
            Fairness::Unfair => false,
        };
        if !triggered {
            continue;
        }
        let taken_inside = comp.iter().any(|&id| {
            graph
                .edges(id)
                .iter()
                .any(|e| e.action == a && comp_of[e.target.as_usize()] == comp_idx)
        });
        if !taken_inside {
            return false;
        }
    }
    true
}

// ============================================================================
// Property checks
// ============================================================================

/// Evaluate a predicate over every interned state.
fn eval_all(store: &StateStore, graph: &StateGraph, pred: &Pred) -> Vec<bool> {
    graph
        .ids()
        .map(|id| store.with_state(id, |s| pred.eval(s)))
        .collect()
}

/// `[]<>P`: violated by a reachable fair SCC with no P-state at all.
fn check_always_eventually(
    graph: &StateGraph,
    store: &StateStore,
    comps: &[Vec<StateId>],
    comp_of: &[usize],
    fair: &[bool],
    p: &Pred,
) -> Option<Trace> {
    let sat = eval_all(store, graph, p);
    let entry = best_entry(comps, fair, |_, comp| {
        if !non_trivial(graph, comp) || comp.iter().any(|id| sat[id.as_usize()]) {
            return None;
        }
        Some(comp[0])
    })?;
    Some(lasso(graph, store, comp_of, entry, Trace::prefix_to(graph, store, entry)))
}

/// `<>[]P`: violated by a reachable fair SCC that visits a non-P state.
fn check_eventually_always(
    graph: &StateGraph,
    store: &StateStore,
    comps: &[Vec<StateId>],
    comp_of: &[usize],
    fair: &[bool],
    p: &Pred,
) -> Option<Trace> {
    let sat = eval_all(store, graph, p);
    let entry = best_entry(comps, fair, |_, comp| {
        if !non_trivial(graph, comp) {
            return None;
        }
        // Entry is the lowest-id witness: a member where P fails.
        comp.iter().copied().find(|id| !sat[id.as_usize()])
    })?;
    Some(lasso(graph, store, comp_of, entry, Trace::prefix_to(graph, store, entry)))
}

/// `<>P`: violated by a fair SCC with no P-state that is reachable from an
/// init state without ever passing through a P-state.
fn check_eventually(
    graph: &StateGraph,
    store: &StateStore,
    comps: &[Vec<StateId>],
    comp_of: &[usize],
    fair: &[bool],
    p: &Pred,
) -> Option<Trace> {
    let sat = eval_all(store, graph, p);
    let seeds: Vec<StateId> = graph
        .inits()
        .iter()
        .copied()
        .filter(|id| !sat[id.as_usize()])
        .collect();
    let region = restricted_reach(graph, &seeds, |id| !sat[id.as_usize()]);

    let entry = best_entry(comps, fair, |_, comp| {
        if !non_trivial(graph, comp) || comp.iter().any(|id| sat[id.as_usize()]) {
            return None;
        }
        comp.iter()
            .copied()
            .find(|id| region.visited[id.as_usize()])
    })?;

    let prefix = region.path_to(store, entry);
    Some(lasso(graph, store, comp_of, entry, prefix))
}

/// `P ~> Q`: violated by a reachable P-state from which a fair Q-free SCC is
/// reachable without ever passing through a Q-state.
fn check_leads_to(
    graph: &StateGraph,
    store: &StateStore,
    comps: &[Vec<StateId>],
    comp_of: &[usize],
    fair: &[bool],
    p: &Pred,
    q: &Pred,
) -> Option<Trace> {
    let sat_p = eval_all(store, graph, p);
    let sat_q = eval_all(store, graph, q);
    // A P-state that is also a Q-state satisfies the obligation on the spot.
    let seeds: Vec<StateId> = graph
        .ids()
        .filter(|id| sat_p[id.as_usize()] && !sat_q[id.as_usize()])
        .collect();
    if seeds.is_empty() {
        return None;
    }
    let region = restricted_reach(graph, &seeds, |id| !sat_q[id.as_usize()]);

    let entry = best_entry(comps, fair, |_, comp| {
        if !non_trivial(graph, comp) || comp.iter().any(|id| sat_q[id.as_usize()]) {
            return None;
        }
        comp.iter()
            .copied()
            .find(|id| region.visited[id.as_usize()])
    })?;

    // Prefix: init -> seed via the discovery tree, then seed -> entry inside
    // the Q-free region.
    let tail = region.path_to(store, entry);
    let seed = tail.steps.first().map(|s| store.lookup(&s.state))??;
    let mut prefix = Trace::prefix_to(graph, store, seed);
    prefix.steps.extend(tail.steps.into_iter().skip(1));
    Some(lasso(graph, store, comp_of, entry, prefix))
}

/// Pick the violating SCC deterministically: lowest entry id wins.
fn best_entry(
    comps: &[Vec<StateId>],
    fair: &[bool],
    mut candidate: impl FnMut(usize, &[StateId]) -> Option<StateId>,
) -> Option<StateId> {
    let mut best: Option<StateId> = None;
    for (ci, comp) in comps.iter().enumerate() {
        if !fair[ci] {
            continue;
        }
        if let Some(entry) = candidate(ci, comp) {
            if best.is_none_or(|b| entry < b) {
                best = Some(entry);
            }
        }
    }
    best
}

// ============================================================================
// Restricted reachability (for <>P and P ~> Q)
// ============================================================================

struct Region {
    visited: Vec<bool>,
    /// Inbound discovery edge per visited state; `None` for seeds.
    parent: Vec<Option<(StateId, Arc<str>)>>,
}

impl Region {
    /// Shortest path from a seed to `target` inside the region, as trace
    /// steps (the seed step carries no inbound action).
    fn path_to(&self, store: &StateStore, target: StateId) -> Trace {
        let mut steps = Vec::new();
        let mut current = target;
        loop {
            match &self.parent[current.as_usize()] {
                Some((source, label)) => {
                    steps.push(TraceStep {
                        state: store.get(current),
                        action: Some(label.clone()),
                    });
                    current = *source;
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
}

/// BFS from `seeds` visiting only states where `allowed` holds. Seeds are
/// processed in id order and edges in lowest-target-first order, so parent
/// assignment is deterministic.
fn restricted_reach(
    graph: &StateGraph,
    seeds: &[StateId],
    allowed: impl Fn(StateId) -> bool,
) -> Region {
    let n = graph.len();
    let mut region = Region {
        visited: vec![false; n],
        parent: vec![None; n],
    };
    let mut sorted_seeds: Vec<StateId> = seeds.to_vec();
    sorted_seeds.sort();

    let mut queue = VecDeque::new();
    for &s in &sorted_seeds {
        if allowed(s) && !region.visited[s.as_usize()] {
            region.visited[s.as_usize()] = true;
            queue.push_back(s);
        }
    }

    while let Some(v) = queue.pop_front() {
        let mut edges: Vec<_> = graph.edges(v).iter().collect();
        edges.sort_by_key(|e| (e.target, e.action));
        for e in edges {
            let t = e.target;
            if region.visited[t.as_usize()] || !allowed(t) {
                continue;
            }
            region.visited[t.as_usize()] = true;
            region.parent[t.as_usize()] = Some((v, e.label.clone()));
            queue.push_back(t);
        }
    }
    region
}

// ============================================================================
// Lasso construction
// ============================================================================

/// Attach one full cyclic traversal of `entry`'s SCC to the prefix.
///
/// The cycle is the shortest path from `entry` back to itself staying inside
/// the SCC, with edges scanned lowest-target-first at every step. A
/// self-loop yields the single step `entry -> entry`.
fn lasso(
    graph: &StateGraph,
    store: &StateStore,
    comp_of: &[usize],
    entry: StateId,
    prefix: Trace,
) -> Trace {
    let comp_idx = comp_of[entry.as_usize()];
    let intra = |v: StateId| {
        let mut edges: Vec<_> = graph
            .edges(v)
            .iter()
            .filter(|e| comp_of[e.target.as_usize()] == comp_idx)
            .collect();
        edges.sort_by_key(|e| (e.target, e.action));
        edges
    };

    // Immediate self-loop wins: it is the shortest cycle and has the lowest
    // possible next id.
    for e in intra(entry) {
        if e.target == entry {
            return prefix.with_cycle(store, [(entry, e.label.clone())]);
        }
    }

    // BFS back to entry.
    let n = graph.len();
    let mut parent: Vec<Option<(StateId, Arc<str>)>> = vec![None; n];
    let mut visited = vec![false; n];
    visited[entry.as_usize()] = true;
    let mut queue = VecDeque::new();
    queue.push_back(entry);

    while let Some(v) = queue.pop_front() {
        for e in intra(v) {
            if e.target == entry {
                // Close the cycle: entry -> ... -> v -> entry.
                let mut rev = vec![(entry, e.label.clone())];
                let mut cur = v;
                while cur != entry {
                    let (src, label) = parent[cur.as_usize()]
                        .clone()
                        .expect("cycle interior lost its parent");
                    rev.push((cur, label));
                    cur = src;
                }
                rev.reverse();
                return prefix.with_cycle(store, rev);
            }
            if !visited[e.target.as_usize()] {
                visited[e.target.as_usize()] = true;
                parent[e.target.as_usize()] = Some((v, e.label.clone()));
                queue.push_back(e.target);
            }
        }
    }

    // Unreachable for a non-trivial SCC: every member can reach every other.
    debug_assert!(false, "no cycle found inside a non-trivial SCC");
    prefix
}
