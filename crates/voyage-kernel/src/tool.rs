//! Tool Capability Contract
//!
//! The engine depends on tools only through this trait: a name, a declared
//! step cost, a precondition over the current [`State`], candidate argument
//! proposal, and an application that yields one or more candidate states or
//! a typed [`ToolFailure`]. Concrete tools (HTTP services, LLM calls, local
//! lookups) live outside the kernel.
//!
//! A tool may be nondeterministic: `apply` can return several candidate
//! states (e.g. a search tool returning multiple destination options), and
//! the engine branches over all of them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constraint::Goal;
use crate::state::State;

/// Ordered argument tuple for a tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolArgs(pub Vec<String>);

impl ToolArgs {
    /// An empty argument tuple.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Build from any iterator of string-likes.
    pub fn of<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ToolArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// How a tool call failed, as seen by the replanning policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Worth retrying with the same arguments (timeout, rate limit).
    Transient,
    /// Retrying cannot help (precondition contradiction, invalid request).
    Permanent,
    /// The tool produced zero candidates without raising a failure; treated
    /// as permanent for the branch.
    EmptyResult,
}

/// Typed failure returned by [`Tool::apply`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Tool call failed ({kind:?}): {message}")]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn empty_result(tool: &str) -> Self {
        Self {
            kind: FailureKind::EmptyResult,
            message: format!("Tool '{}' produced zero candidate states", tool),
        }
    }

    /// Transient failures may be retried; everything else prunes the branch.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, FailureKind::Transient)
    }
}

/// A planning capability.
///
/// # Example
///
/// ```rust,ignore
/// use voyage_kernel::tool::{Tool, ToolArgs, ToolFailure};
///
/// struct SetOrigin { city: String }
///
/// #[async_trait]
/// impl Tool for SetOrigin {
///     fn name(&self) -> &str { "set_origin" }
///     fn preconditions(&self, state: &State) -> bool { !state.is_assigned("origin") }
///     fn propose_args(&self, _state: &State, _goal: &Goal) -> Vec<ToolArgs> {
///         vec![ToolArgs::of([self.city.clone()])]
///     }
///     async fn apply(&self, state: &State, args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
///         Ok(vec![state.with_slot("origin", args.first().unwrap_or_default())])
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique identifier within a tool set).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Declared cost of one application. Tools may declare a higher cost for
    /// expensive operations; negative values are clamped to zero.
    fn step_cost(&self) -> f64 {
        1.0
    }

    /// Whether the tool is applicable in the given state.
    fn preconditions(&self, state: &State) -> bool;

    /// Candidate argument tuples for applying this tool in the given state.
    ///
    /// The default is a single empty tuple (for tools that take no
    /// arguments). Argument proposal for open-ended tools (e.g. candidate
    /// cities extracted from the user request) is a tool concern, not an
    /// engine rule.
    fn propose_args(&self, state: &State, goal: &Goal) -> Vec<ToolArgs> {
        let _ = (state, goal);
        vec![ToolArgs::none()]
    }

    /// Apply the tool, returning one or more candidate states.
    ///
    /// Candidates should be built with [`State::with_slot`]; the successor
    /// generator finalizes them (parent link, cost, constraint evaluation).
    async fn apply(&self, state: &State, args: &ToolArgs) -> Result<Vec<State>, ToolFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_display() {
        assert_eq!(ToolArgs::of(["New York", "plane"]).to_string(), "(New York, plane)");
        assert_eq!(ToolArgs::none().to_string(), "()");
    }

    #[test]
    fn failure_classification() {
        assert!(ToolFailure::transient("rate limited").is_transient());
        assert!(!ToolFailure::permanent("slot already assigned").is_transient());
        assert!(!ToolFailure::empty_result("set_destination").is_transient());
    }

    #[test]
    fn failure_display_names_the_kind() {
        let failure = ToolFailure::empty_result("set_destination");
        assert!(failure.to_string().contains("set_destination"));
        assert!(failure.to_string().contains("EmptyResult"));
    }
}
