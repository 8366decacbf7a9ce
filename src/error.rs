//! Error types
//!
//! Two distinct failure families:
//!
//! - `ConfigError`: the model itself is malformed. Surfaced from
//!   [`Checker::run`](crate::explorer::Checker::run) before any exploration
//!   starts, never mid-run.
//! - `ActionFault`: an action's `apply` faulted while exploring. This aborts
//!   the run as `EvaluatorFault` and is never reinterpreted as "disabled".
//!
//! Violations (invariant, deadlock, liveness) are *not* errors: they are the
//! checker's findings and come back as statuses on an `ExplorationResult`
//! with a full counterexample trace.

use std::sync::Arc;
use thiserror::Error;

/// A malformed model, rejected before exploration starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model has no initial states")]
    EmptyInit,
    #[error("duplicate initial state at index {0}")]
    DuplicateInit(usize),
    #[error("duplicate action name: {0}")]
    DuplicateAction(Arc<str>),
    #[error("duplicate invariant name: {0}")]
    DuplicateInvariant(Arc<str>),
    #[error("duplicate constraint name: {0}")]
    DuplicateConstraint(Arc<str>),
    #[error("duplicate property name: {0}")]
    DuplicateProperty(Arc<str>),
}

/// A fault raised by an action's `apply`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("action evaluator fault: {message}")]
pub struct ActionFault {
    pub message: Arc<str>,
}

impl ActionFault {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        ActionFault {
            message: message.into(),
        }
    }
}
