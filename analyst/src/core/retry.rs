//! Pure decision logic for the retry controller.
//!
//! After every execution the controller asks this module what to do next. The
//! answer depends only on the outcome, the attempt counter, and the run-level
//! replanned flag, so the policy is fully unit-testable without a sandbox.

/// Default generation-attempt ceiling per task text.
pub const DEFAULT_MAX_ITERATIONS: u32 = 6;

/// Next transition for the per-task state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Execution succeeded: hand the task to the completion gate.
    Advance,
    /// Execution failed with budget left: reflect, then regenerate.
    Reflect,
    /// Budget exhausted and the run has not replanned yet: rewrite the task
    /// once and start over with a fresh budget.
    Escalate,
    /// Budget exhausted again after the one-shot rewrite: abort the run.
    Fatal,
}

/// Decide the next transition after an execution.
///
/// `iterations` is the number of generation attempts made for the current
/// task text; the ceiling is compared after the failing attempt has been
/// counted. The replanned flag is run-lifetime and sticky: once any task has
/// escalated, a second exhaustion anywhere in the run is fatal.
pub fn decide(
    succeeded: bool,
    iterations: u32,
    max_iterations: u32,
    replanned: bool,
) -> RetryDecision {
    if succeeded {
        return RetryDecision::Advance;
    }
    if iterations < max_iterations {
        return RetryDecision::Reflect;
    }
    if replanned {
        RetryDecision::Fatal
    } else {
        RetryDecision::Escalate
    }
}
