//! Replanning / Failure Policy
//!
//! Decides what happens when a tool call fails: transient failures are
//! retried with the same arguments up to a configured total attempt count;
//! permanent failures (including exhausted retries and empty results) prune
//! the branch. A branch failure never aborts the overall search — the
//! frontier loop simply continues without that branch.

use crate::tool::ToolFailure;

/// What the successor generator should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Retry the same call with the same arguments.
    Retry,
    /// Drop this branch and continue the search elsewhere.
    Prune,
}

/// Retry budget and classification rules.
#[derive(Debug, Clone, Copy)]
pub struct FailurePolicy {
    /// Total attempts per call site, including the first.
    max_attempts: u32,
}

impl FailurePolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Total attempts allowed per call site.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classify a failed attempt. `attempt` is 1-based.
    ///
    /// Exhausting retries on a transient failure converts it to permanent
    /// for the branch.
    pub fn decide(&self, failure: &ToolFailure, attempt: u32) -> FailureAction {
        if failure.is_transient() && attempt < self.max_attempts {
            FailureAction::Retry
        } else {
            FailureAction::Prune
        }
    }
}
