//! Voyage Kernel — best-first search over tool capabilities.
//!
//! Plans a sequence of tool invocations that turns an underspecified travel
//! request into a fully-specified, constraint-satisfying plan. The engine
//! depends only on the [`tool::Tool`] capability trait and writes its audit
//! trail through the [`trace::TraceSink`] seam; concrete tools, prompting,
//! and visualization live outside this crate.

// error module
pub mod error;

// state module
pub mod state;

// constraint / goal module
pub mod constraint;

// tool contract
pub mod tool;

// successor generation
pub mod successor;

// heuristic estimation
pub mod heuristic;

// search engine
pub mod search;

// replanning / failure policy
pub mod policy;

// execution trace
pub mod trace;

// configuration
pub mod config;

// cancellation
pub mod interrupt;

// plan result
pub mod plan;

// built-in tools
pub mod tools;

pub use config::SearchConfig;
pub use constraint::{Constraint, ConstraintKind, ConstraintStatus, Goal, SlotPredicate};
pub use error::{PlanResult, PlannerError};
pub use heuristic::{HeuristicMode, HintSource};
pub use interrupt::SearchInterrupt;
pub use plan::{Plan, PlanStep};
pub use search::{SearchEngine, SearchReport};
pub use state::{SlotValue, State};
pub use tool::{FailureKind, Tool, ToolArgs, ToolFailure};
pub use trace::{CallOutcome, InMemoryTrace, TerminalStatus, ToolCallRecord, TraceSink};
