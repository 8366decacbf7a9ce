//! BFS exploration engine
//!
//! The explorer drains a frontier of unexpanded states breadth-first. For
//! each state it asks every action for successors, interns them, filters
//! through the constraints, records transition edges, and runs the
//! invariant and deadlock checks. When the frontier empties without a
//! safety violation, the accumulated graph goes to the liveness checker.
//!
//! # Execution modes
//!
//! Single-threaded mode (the default) runs the whole pipeline inline and is
//! byte-for-byte deterministic: discovery order, state counts, and trace
//! contents reproduce exactly across runs with identical inputs.
//!
//! Worker-pool mode fans the action evaluation — the only caller-supplied,
//! potentially expensive step — out to `workers` threads over channels. The
//! collector (this thread) remains the sole owner of the store and graph, so
//! `intern` is atomic and a state's parent edge is assigned exactly once, by
//! its discoverer, with no lock discipline to get wrong. Suspension points
//! are only at the frontier-pop / successor-intern boundaries.

use crate::config::RunConfig;
use crate::error::{ActionFault, ConfigError};
use crate::graph::{Edge, Parent, StateGraph};
use crate::liveness;
use crate::model::Model;
use crate::report::{ExplorationResult, RunStatus};
use crate::state::State;
use crate::store::{StateId, StateStore, StoreFull};
use crate::trace::Trace;
use crossbeam_channel::RecvTimeoutError;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The model checker. Borrows a validated [`Model`] and runs it under a
/// [`RunConfig`].
pub struct Checker<'m> {
    model: &'m Model,
}

impl<'m> Checker<'m> {
    pub fn new(model: &'m Model) -> Self {
        Checker { model }
    }

    /// Explore the state space and check every configured invariant,
    /// deadlock condition, and temporal property.
    ///
    /// Configuration errors surface here, before the first state is
    /// interned. Everything that happens *during* the run — violations,
    /// faults, exhaustion, cancellation — comes back as a status on the
    /// `ExplorationResult`.
    pub fn run(&self, config: &RunConfig) -> Result<ExplorationResult, ConfigError> {
        self.model.validate()?;

        let mut run = Run {
            model: self.model,
            config,
            store: StateStore::new(config.max_states),
            graph: StateGraph::new(self.model.actions.len()),
            frontier: VecDeque::new(),
            states_explored: 0,
            violation: None,
        };

        let outcome = run.seed().and_then(|()| {
            if config.workers > 1 {
                run.explore_pooled(config.workers)
            } else {
                run.explore_inline()
            }
        });

        Ok(run.finish(outcome))
    }
}

/// First safety violation found. Kept pending so that
/// `stop_on_first_violation = false` can finish the sweep before reporting.
enum Violation {
    Invariant {
        target: StateId,
        names: Vec<Arc<str>>,
    },
    Deadlock {
        target: StateId,
    },
}

/// Why exploration stopped before the frontier emptied.
enum Halt {
    Violation,
    Exhausted,
    Cancelled,
    Fault { action: Arc<str>, fault: ActionFault },
    Timeout { action: Arc<str> },
    /// A pool worker disappeared (panicked) mid-run.
    PoolFailure,
}

/// Everything one action-evaluation pass over a state produced.
struct Expansion {
    source: StateId,
    /// `(action index, instance label, successor state)` in action order.
    successors: Vec<(u16, Arc<str>, State)>,
    /// Actions with at least one successor.
    enabled: Vec<u16>,
}

struct Run<'m, 'c> {
    model: &'m Model,
    config: &'c RunConfig,
    store: StateStore,
    graph: StateGraph,
    frontier: VecDeque<StateId>,
    states_explored: u64,
    violation: Option<Violation>,
}

impl Run<'_, '_> {
    /// Seed the frontier with the init states, in declaration order.
    fn seed(&mut self) -> Result<(), Halt> {
        for init in &self.model.inits {
            self.states_explored += 1;
            let (id, is_new) = match self.store.intern(init.clone()) {
                Ok(r) => r,
                Err(StoreFull) => return Err(Halt::Exhausted),
            };
            debug_assert!(is_new, "validation rejects duplicate inits");
            self.graph.push_node(id, None, 0);
            self.graph.mark_init(id);
            self.admit(id)?;
        }
        debug!(inits = self.model.inits.len(), "frontier seeded");
        Ok(())
    }

    /// Invariant-check a freshly interned state, then either queue it for
    /// expansion or record it as a pruned leaf.
    fn admit(&mut self, id: StateId) -> Result<(), Halt> {
        let failed: Vec<Arc<str>> = self.store.with_state(id, |state| {
            self.model
                .invariants
                .iter()
                .filter(|inv| !inv.0.eval(state))
                .map(|inv| inv.0.name().clone())
                .collect()
        });
        if !failed.is_empty() {
            if self.violation.is_none() {
                self.violation = Some(Violation::Invariant { target: id, names: failed });
                if self.config.stop_on_first_violation {
                    return Err(Halt::Violation);
                }
            }
            // A state that already violates safety is still a leaf of the
            // graph; do not expand past it.
            self.graph.mark_pruned(id);
            return Ok(());
        }

        let holds = self
            .store
            .with_state(id, |state| self.model.constraints.iter().all(|c| c.0.eval(state)));
        if holds {
            self.frontier.push_back(id);
        } else {
            self.graph.mark_pruned(id);
        }
        Ok(())
    }

    /// Intern and record one expansion's successors; deadlock-check the
    /// source.
    fn absorb(&mut self, expansion: Expansion) -> Result<(), Halt> {
        let source = expansion.source;
        let depth = self.graph.node(source).depth;
        let mut edges: SmallVec<[Edge; 4]> = SmallVec::new();

        for (action, label, successor) in expansion.successors {
            self.states_explored += 1;
            let (target, is_new) = match self.store.intern(successor) {
                Ok(r) => r,
                Err(StoreFull) => {
                    // Record what we have so the partial graph stays sound.
                    self.graph.record_expansion(source, edges, expansion.enabled);
                    return Err(Halt::Exhausted);
                }
            };
            edges.push(Edge {
                action,
                label: label.clone(),
                target,
            });
            if is_new {
                self.graph
                    .push_node(target, Some(Parent { source, label }), depth + 1);
                self.admit(target)?;
            }
        }

        let deadlocked = edges.is_empty();
        self.graph.record_expansion(source, edges, expansion.enabled);

        if deadlocked && self.config.check_deadlock && self.violation.is_none() {
            self.violation = Some(Violation::Deadlock { target: source });
            if self.config.stop_on_first_violation {
                return Err(Halt::Violation);
            }
        }
        Ok(())
    }

    /// Single-threaded drain: deterministic discovery order.
    fn explore_inline(&mut self) -> Result<(), Halt> {
        while let Some(id) = self.frontier.pop_front() {
            if self.config.cancellation.is_cancelled() {
                return Err(Halt::Cancelled);
            }
            let state = self.store.get(id);
            let expansion = evaluate(self.model, id, &state, self.config)?;
            self.absorb(expansion)?;
        }
        Ok(())
    }

    /// Worker-pool drain: workers evaluate actions, this thread collects.
    fn explore_pooled(&mut self, workers: usize) -> Result<(), Halt> {
        // How long the collector blocks on the result channel before
        // re-checking the cancellation token.
        const CANCEL_POLL: Duration = Duration::from_millis(20);

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(StateId, State)>();
        let (result_tx, result_rx) =
            crossbeam_channel::unbounded::<(StateId, Result<Expansion, Halt>)>();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let model = self.model;
                let config = self.config;
                scope.spawn(move || {
                    for (id, state) in job_rx.iter() {
                        // Skip queued work once the token fires rather than
                        // draining the whole backlog.
                        if config.cancellation.is_cancelled() {
                            break;
                        }
                        let outcome = evaluate(model, id, &state, config);
                        if result_tx.send((id, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            let mut in_flight = 0usize;
            let outcome = 'collect: loop {
                if self.config.cancellation.is_cancelled() {
                    break Err(Halt::Cancelled);
                }
                while let Some(id) = self.frontier.pop_front() {
                    let state = self.store.get(id);
                    if job_tx.send((id, state)).is_err() {
                        break 'collect Err(Halt::PoolFailure);
                    }
                    in_flight += 1;
                }
                if in_flight == 0 {
                    break Ok(());
                }
                let (_, result) = loop {
                    match result_rx.recv_timeout(CANCEL_POLL) {
                        Ok(r) => break r,
                        Err(RecvTimeoutError::Timeout) => {
                            if self.config.cancellation.is_cancelled() {
                                break 'collect Err(Halt::Cancelled);
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            break 'collect Err(Halt::PoolFailure);
                        }
                    }
                };
                in_flight -= 1;
                match result {
                    Ok(expansion) => {
                        if let Err(halt) = self.absorb(expansion) {
                            break Err(halt);
                        }
                    }
                    Err(halt) => break Err(halt),
                }
            };
            drop(job_tx);
            outcome
        })
    }

    /// Turn the exploration outcome into the final result, running the
    /// liveness pass when BFS completed cleanly.
    fn finish(&mut self, outcome: Result<(), Halt>) -> ExplorationResult {
        let distinct = self.store.len();
        let mut result = ExplorationResult {
            status: RunStatus::Success,
            states_explored: self.states_explored,
            distinct_states: distinct,
            violated: None,
            failed_invariants: Vec::new(),
            trace: None,
        };

        match outcome {
            // A violation recorded before the halt still wins: its trace is
            // fully reconstructible from the parents assigned at discovery.
            Err(Halt::Exhausted) if self.violation.is_none() => {
                warn!(distinct, "state cap hit; returning partial result");
                result.status = RunStatus::ResourceExhausted;
                return result;
            }
            Err(Halt::Cancelled) if self.violation.is_none() => {
                result.status = RunStatus::Cancelled;
                return result;
            }
            Err(Halt::Fault { action, fault }) => {
                warn!(action = %action, "evaluator fault: {}", fault);
                result.status = RunStatus::EvaluatorFault;
                result.violated = Some(action);
                return result;
            }
            Err(Halt::Timeout { action }) => {
                warn!(action = %action, "evaluator exceeded its time budget");
                result.status = RunStatus::EvaluatorTimeout;
                result.violated = Some(action);
                return result;
            }
            Err(Halt::PoolFailure) => {
                warn!("worker thread lost; reporting evaluator fault");
                result.status = RunStatus::EvaluatorFault;
                return result;
            }
            Err(Halt::Exhausted | Halt::Cancelled | Halt::Violation) | Ok(()) => {}
        }

        match self.violation.take() {
            Some(Violation::Invariant { target, names }) => {
                result.status = RunStatus::InvariantViolation;
                result.violated = names.first().cloned();
                result.failed_invariants = names;
                result.trace = Some(Trace::prefix_to(&self.graph, &self.store, target));
            }
            Some(Violation::Deadlock { target }) => {
                result.status = RunStatus::DeadlockViolation;
                result.trace = Some(Trace::prefix_to(&self.graph, &self.store, target));
            }
            None => {
                if let Some(outcome) = liveness::check(self.model, &self.graph, &self.store) {
                    result.status = RunStatus::LivenessViolation;
                    result.violated = Some(outcome.property);
                    result.trace = Some(outcome.trace);
                }
            }
        }

        info!(
            status = %result.status,
            generated = result.states_explored,
            distinct = result.distinct_states,
            "run complete"
        );
        result
    }
}

/// Apply every action to one state, timing each call against the configured
/// budget. A fault or an overrun aborts the run; it is never read as "no
/// successors".
fn evaluate(
    model: &Model,
    source: StateId,
    state: &State,
    config: &RunConfig,
) -> Result<Expansion, Halt> {
    let mut successors = Vec::new();
    let mut enabled = Vec::new();

    for (idx, action) in model.actions.iter().enumerate() {
        let started = Instant::now();
        let produced = action.apply(state);
        if let Some(budget) = config.action_timeout {
            if started.elapsed() > budget {
                return Err(Halt::Timeout {
                    action: action.name().clone(),
                });
            }
        }
        let produced = produced.map_err(|fault| Halt::Fault {
            action: action.name().clone(),
            fault,
        })?;
        if !produced.is_empty() {
            enabled.push(idx as u16);
        }
        for (label, successor) in produced {
            successors.push((idx as u16, label, successor));
        }
    }

    Ok(Expansion {
        source,
        successors,
        enabled,
    })
}
