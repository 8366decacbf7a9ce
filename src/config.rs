//! Run configuration and cancellation
//!
//! Every toggle that steers a run is an explicit field here, never
//! process-wide state, so the checker stays reentrant: two runs with
//! different configurations can share a process (or a test binary) without
//! interfering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation token.
///
/// Cloneable handle over a shared flag. The explorer checks it at every
/// frontier pop and returns a partial `Cancelled` result once it fires; it
/// never preempts an in-flight action evaluation.
#[derive(Clone, Default)]
pub struct CancellationToken {
    fired: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.fired.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Configuration for a single checking run.
#[derive(Clone)]
pub struct RunConfig {
    /// Report fully-expanded states with zero enabled actions as deadlocks.
    /// Disable for intentionally terminal designs.
    pub check_deadlock: bool,
    /// Hard cap on distinct states; exceeding it ends the run with a partial
    /// `ResourceExhausted` result.
    pub max_states: usize,
    /// Halt on the first invariant/deadlock violation (BFS makes it a
    /// shortest counterexample). When false, the first violation is still
    /// the one reported but exploration continues to completion, which
    /// yields full `states_explored`/`distinct_states` statistics.
    pub stop_on_first_violation: bool,
    /// Worker threads for action evaluation. `0` or `1` selects the fully
    /// deterministic single-threaded mode.
    pub workers: usize,
    /// Per-call budget for `Action::apply`; exceeding it aborts the run as
    /// `EvaluatorTimeout`. Enforcement is cooperative: the overrun is
    /// detected when the call returns, so an evaluator that never returns
    /// still hangs the run.
    pub action_timeout: Option<Duration>,
    /// Cooperative cancellation, checked at each frontier pop.
    pub cancellation: CancellationToken,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            check_deadlock: true,
            max_states: 1_000_000,
            stop_on_first_violation: true,
            workers: 0,
            action_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_deadlock_check(mut self) -> Self {
        self.check_deadlock = false;
        self
    }

    pub fn with_max_states(mut self, max: usize) -> Self {
        self.max_states = max;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_action_timeout(mut self, budget: Duration) -> Self {
        self.action_timeout = Some(budget);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}
