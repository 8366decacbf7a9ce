//! Run results
//!
//! Violations are the tool's intended findings, not errors: they come back
//! as statuses carrying a complete counterexample trace. Resource and
//! evaluator failures return partial results so callers still see how far
//! the run got. Rendering is the caller's responsibility; `Display` here is
//! a convenience summary only.

use crate::trace::Trace;
use std::fmt;
use std::sync::Arc;

/// Final status of a checking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Frontier emptied with no violation; all properties hold.
    Success,
    /// A safety invariant failed on a reachable state.
    InvariantViolation,
    /// A fully-expanded reachable state had zero enabled actions.
    DeadlockViolation,
    /// A temporal property is violated by a reachable fair cycle.
    LivenessViolation,
    /// Distinct-state count exceeded `max_states`; partial result.
    ResourceExhausted,
    /// An action's `apply` exceeded its time budget; run aborted.
    EvaluatorTimeout,
    /// An action's `apply` faulted; run aborted.
    EvaluatorFault,
    /// The cancellation token fired; partial result.
    Cancelled,
}

impl RunStatus {
    /// Whether this status is a checker finding (carries a counterexample).
    pub fn is_violation(self) -> bool {
        matches!(
            self,
            RunStatus::InvariantViolation
                | RunStatus::DeadlockViolation
                | RunStatus::LivenessViolation
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::InvariantViolation => "invariant violation",
            RunStatus::DeadlockViolation => "deadlock",
            RunStatus::LivenessViolation => "liveness violation",
            RunStatus::ResourceExhausted => "resource exhausted",
            RunStatus::EvaluatorTimeout => "evaluator timeout",
            RunStatus::EvaluatorFault => "evaluator fault",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Everything a run reports back.
#[derive(Debug, Clone)]
pub struct ExplorationResult {
    pub status: RunStatus,
    /// Total states generated (inits plus every successor, duplicates
    /// included).
    pub states_explored: u64,
    /// Distinct states interned.
    pub distinct_states: usize,
    /// Name of the violated invariant/property, the faulting action, or
    /// `None` (e.g. deadlock, success).
    pub violated: Option<Arc<str>>,
    /// For invariant violations: every invariant that failed on the
    /// violating state, in declaration order. The first entry is the
    /// canonical violation reported in `violated`.
    pub failed_invariants: Vec<Arc<str>>,
    /// Counterexample, when the status is a violation (lasso-shaped for
    /// liveness).
    pub trace: Option<Trace>,
}

impl ExplorationResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

impl fmt::Display for ExplorationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} states generated, {} distinct",
            self.status, self.states_explored, self.distinct_states
        )?;
        if let Some(name) = &self.violated {
            write!(f, " (violated: {})", name)?;
        }
        Ok(())
    }
}
