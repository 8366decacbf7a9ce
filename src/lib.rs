//! veristate: an explicit-state model checker for finite transition systems
//!
//! The engine explores every state reachable from a set of declared initial
//! states, breadth-first, checking safety invariants on each newly
//! discovered state and detecting deadlocks. Once the reachable graph is
//! complete, temporal properties (`eventually`, `always eventually`,
//! `eventually always`, `leads-to`) are checked against its strongly
//! connected components under weak/strong fairness assumptions. Every
//! violation comes back with a reproducible counterexample: a shortest path
//! for safety, a lasso (prefix plus repeating cycle) for liveness.
//!
//! This is an explicit-state checker: it enumerates concrete states and is
//! bounded by `max_states`. It is not a symbolic (SAT/SMT) checker and does
//! not reason about infinite domains.
//!
//! # Example
//!
//! Two counters that transfer between each other, with a conservation
//! invariant:
//!
//! ```
//! use veristate::{Checker, FnAction, Model, RunConfig, RunStatus, State, Value};
//!
//! fn transfer(from: &'static str, to: &'static str) -> FnAction {
//!     FnAction::simple(format!("{}_to_{}", from, to), move |s: &State| {
//!         let balance = s.get_int(from).unwrap();
//!         if balance >= 30 {
//!             vec![s.with_vars([
//!                 (from, Value::int(balance - 30)),
//!                 (to, Value::int(s.get_int(to).unwrap() + 30)),
//!             ])]
//!         } else {
//!             vec![]
//!         }
//!     })
//! }
//!
//! let model = Model::new()
//!     .init(State::from_pairs([("a", Value::int(50)), ("b", Value::int(50))]))
//!     .action(transfer("a", "b"))
//!     .action(transfer("b", "a"))
//!     .invariant("conserved", |s| {
//!         s.get_int("a").unwrap() + s.get_int("b").unwrap() == 100
//!     });
//!
//! let result = Checker::new(&model).run(&RunConfig::default()).unwrap();
//! assert_eq!(result.status, RunStatus::Success);
//! ```
//!
//! # Determinism
//!
//! Single-threaded runs (the default) are fully reproducible: identical
//! inputs yield identical state counts and identical traces. The optional
//! worker-pool mode keeps every correctness guarantee but not discovery
//! order.

pub mod config;
pub mod error;
pub mod explorer;
pub mod fingerprint;
pub mod graph;
mod liveness;
pub mod model;
pub mod report;
pub mod state;
pub mod store;
pub mod trace;
pub mod value;

pub use config::{CancellationToken, RunConfig};
pub use error::{ActionFault, ConfigError};
pub use explorer::Checker;
pub use model::{Action, Fairness, FnAction, Model, Pred, Property, Temporal};
pub use report::{ExplorationResult, RunStatus};
pub use state::{Fingerprint, State};
pub use store::{StateId, StateStore};
pub use trace::{Trace, TraceStep};
pub use value::Value;
