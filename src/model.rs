//! Model definition: actions, invariants, constraints, properties
//!
//! This is the interface the checker consumes from the host layer that
//! authored the design (a DSL, hand-written Rust, a translator). The engine
//! only ever sees:
//!
//! - initial states, seeded in declaration order,
//! - named [`Action`]s that enumerate successors explicitly,
//! - named safety [`Invariant`]s and pruning [`Constraint`]s,
//! - named temporal [`Property`]s, with fairness attached to actions.
//!
//! # Guards and non-determinism
//!
//! An action whose guard does not hold returns *zero* successors: the action
//! is disabled in that state. That is distinct from a modeled stutter action
//! that returns the state unchanged, which is a first-class self-loop and
//! counts as an enabled action for deadlock purposes.
//!
//! Non-deterministic choice ("pick any element") is expanded here into one
//! successor per choice. `apply` must be a pure function of its input state;
//! a faulting evaluator aborts the run, never reads as "no successors".

use crate::error::{ActionFault, ConfigError};
use crate::state::State;
use std::collections::HashSet;
use std::sync::Arc;

/// Fairness assumption attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fairness {
    /// No scheduling assumption: the action may starve forever.
    Unfair,
    /// Weak fairness: if continuously enabled, the action eventually fires.
    Weak,
    /// Strong fairness: if enabled infinitely often, it eventually fires.
    Strong,
}

/// One successor produced by an action: the instance name (for traces) and
/// the resulting state.
pub type Successor = (Arc<str>, State);

/// A named transition rule.
///
/// `apply` enumerates every `(instance_name, successor)` pair enabled in the
/// given state. The instance name is usually the action name, but
/// parameterized actions may refine it (e.g. `"Transfer(30)"`).
pub trait Action: Send + Sync {
    fn name(&self) -> &Arc<str>;

    fn fairness(&self) -> Fairness {
        Fairness::Unfair
    }

    fn apply(&self, state: &State) -> Result<Vec<Successor>, ActionFault>;
}

type ApplyFn = dyn Fn(&State) -> Result<Vec<Successor>, ActionFault> + Send + Sync;

/// Closure-backed [`Action`].
pub struct FnAction {
    name: Arc<str>,
    fairness: Fairness,
    apply: Box<ApplyFn>,
}

impl FnAction {
    pub fn new(
        name: impl Into<Arc<str>>,
        apply: impl Fn(&State) -> Result<Vec<Successor>, ActionFault> + Send + Sync + 'static,
    ) -> Self {
        FnAction {
            name: name.into(),
            fairness: Fairness::Unfair,
            apply: Box::new(apply),
        }
    }

    /// An action that never faults and names every successor after itself.
    /// Returning an empty vec means the guard is disabled.
    pub fn simple(
        name: impl Into<Arc<str>>,
        apply: impl Fn(&State) -> Vec<State> + Send + Sync + 'static,
    ) -> Self {
        let name: Arc<str> = name.into();
        let label = name.clone();
        FnAction {
            name,
            fairness: Fairness::Unfair,
            apply: Box::new(move |state| {
                Ok(apply(state)
                    .into_iter()
                    .map(|s| (label.clone(), s))
                    .collect())
            }),
        }
    }

    pub fn with_fairness(mut self, fairness: Fairness) -> Self {
        self.fairness = fairness;
        self
    }
}

impl Action for FnAction {
    fn name(&self) -> &Arc<str> {
        &self.name
    }

    fn fairness(&self) -> Fairness {
        self.fairness
    }

    fn apply(&self, state: &State) -> Result<Vec<Successor>, ActionFault> {
        (self.apply)(state)
    }
}

type PredFn = dyn Fn(&State) -> bool + Send + Sync;

/// A named pure predicate over states.
#[derive(Clone)]
pub struct Pred {
    name: Arc<str>,
    f: Arc<PredFn>,
}

impl Pred {
    pub fn new(
        name: impl Into<Arc<str>>,
        f: impl Fn(&State) -> bool + Send + Sync + 'static,
    ) -> Self {
        Pred {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn eval(&self, state: &State) -> bool {
        (self.f)(state)
    }
}

/// A safety predicate required to hold in every reachable state.
///
/// Evaluated once per newly discovered state, before expansion.
pub struct Invariant(pub(crate) Pred);

/// A pruning predicate. States failing any constraint are recorded as
/// terminal leaves but never expanded.
pub struct Constraint(pub(crate) Pred);

/// Temporal formula shape of a [`Property`].
#[derive(Clone)]
pub enum Temporal {
    /// `<>P`: every behavior eventually reaches a P-state.
    Eventually(Pred),
    /// `[]<>P`: P holds infinitely often.
    AlwaysEventually(Pred),
    /// `<>[]P`: from some point on, P holds forever.
    EventuallyAlways(Pred),
    /// `P ~> Q`: every P-state is eventually followed by a Q-state.
    LeadsTo(Pred, Pred),
}

/// A named temporal property, checked against the full reachable graph
/// after BFS completes.
pub struct Property {
    pub(crate) name: Arc<str>,
    pub(crate) temporal: Temporal,
}

impl Property {
    pub fn new(name: impl Into<Arc<str>>, temporal: Temporal) -> Self {
        Property {
            name: name.into(),
            temporal,
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }
}

/// A complete model: everything the checker consumes for one run.
///
/// Declaration order matters: init states seed the frontier in order, the
/// first declared failing invariant is the canonical violation, and
/// properties are checked in order.
#[derive(Default)]
pub struct Model {
    pub(crate) inits: Vec<State>,
    pub(crate) actions: Vec<Box<dyn Action>>,
    pub(crate) invariants: Vec<Invariant>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) properties: Vec<Property>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(mut self, state: State) -> Self {
        self.inits.push(state);
        self
    }

    pub fn action(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn invariant(
        mut self,
        name: impl Into<Arc<str>>,
        f: impl Fn(&State) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.invariants.push(Invariant(Pred::new(name, f)));
        self
    }

    pub fn constraint(
        mut self,
        name: impl Into<Arc<str>>,
        f: impl Fn(&State) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.constraints.push(Constraint(Pred::new(name, f)));
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Validate the model before exploration.
    ///
    /// Rejects empty or duplicated init states and duplicate names within
    /// each of the action/invariant/constraint/property namespaces. Runs
    /// before the first state is interned, so a malformed model can never
    /// fail mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inits.is_empty() {
            return Err(ConfigError::EmptyInit);
        }
        let mut seen_inits = HashSet::new();
        for (i, init) in self.inits.iter().enumerate() {
            if !seen_inits.insert(init.fingerprint()) {
                return Err(ConfigError::DuplicateInit(i));
            }
        }

        let mut names = HashSet::new();
        for action in &self.actions {
            if !names.insert(action.name().clone()) {
                return Err(ConfigError::DuplicateAction(action.name().clone()));
            }
        }

        names.clear();
        for inv in &self.invariants {
            if !names.insert(inv.0.name().clone()) {
                return Err(ConfigError::DuplicateInvariant(inv.0.name().clone()));
            }
        }

        names.clear();
        for c in &self.constraints {
            if !names.insert(c.0.name().clone()) {
                return Err(ConfigError::DuplicateConstraint(c.0.name().clone()));
            }
        }

        names.clear();
        for p in &self.properties {
            if !names.insert(p.name.clone()) {
                return Err(ConfigError::DuplicateProperty(p.name.clone()));
            }
        }

        Ok(())
    }
}
