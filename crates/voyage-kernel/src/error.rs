//! Crate-level error types for `voyage-kernel`.
//!
//! Provides a unified [`PlannerError`] that composes errors from every
//! sub-module together with [`error_stack::Report`] for rich,
//! context-carrying error propagation.
//!
//! Tool failures and constraint violations are *not* part of this surface:
//! the replanning policy handles them inside the engine and they only ever
//! show up in the execution trace. `PlannerError` covers what can go wrong
//! before or around a search (invalid goals, bad configuration,
//! serialization of the trace surface).

use thiserror::Error;

use crate::heuristic::HintError;
use crate::tool::ToolFailure;

/// Crate-level error type for `voyage-kernel`.
///
/// Wraps each sub-module's typed error via `#[from]` so that the `?`
/// operator converts them automatically. Use
/// [`error_stack::Report<PlannerError>`] (via [`PlanResult`]) to attach
/// human-readable context as the error propagates up the call stack.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlannerError {
    /// A goal or configuration failed structural validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A tool-level failure surfaced outside the engine loop (e.g. when a
    /// caller drives a tool directly).
    #[error("Tool error: {0}")]
    Tool(#[from] ToolFailure),

    /// A hint-source failure surfaced outside the estimator's fallback.
    #[error("Hint error: {0}")]
    Hint(#[from] HintError),

    /// A JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal / untyped error described by a message string.
    #[error("{0}")]
    Internal(String),
}

/// Convenience result alias using [`error_stack::Report`].
///
/// Equivalent to `Result<T, error_stack::Report<PlannerError>>`.
pub type PlanResult<T> = Result<T, error_stack::Report<PlannerError>>;
