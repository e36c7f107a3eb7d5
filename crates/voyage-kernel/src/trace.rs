//! Execution Trace Recorder
//!
//! Every attempted tool call during a search — successful or not — is
//! appended here before the successor generator returns, preserving a
//! complete audit trail even for failed branches. The engine writes through
//! the [`TraceSink`] seam only; rendering and evaluation are entirely
//! external consumers of the recorded structure.
//!
//! Appends are serialized behind a mutex so record ordering reflects a
//! consistent, replayable sequence number rather than true wall-clock race
//! order when expansions run concurrently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::tool::{FailureKind, ToolArgs};

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// A goal state was reached; the plan is the full path to it.
    Success,
    /// The expansion budget ran out; a best-effort non-goal path is returned.
    Exhausted,
    /// The frontier emptied without reaching a goal; no plan exists.
    Unreachable,
    /// An external cancellation signal stopped the run.
    Cancelled,
}

/// Outcome of a single tool call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallOutcome {
    /// The call produced candidate states (flat slot snapshots).
    Expanded {
        candidates: Vec<BTreeMap<String, String>>,
    },
    /// The call failed.
    Failed { kind: FailureKind, message: String },
}

/// One attempted tool call. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Timestamp-ordinal: position in the serialized append order.
    pub seq: u64,
    /// Name of the tool that was called.
    pub tool: String,
    /// Arguments the call was made with.
    pub args: ToolArgs,
    /// 1-based attempt number for this (tool, args) call site.
    pub attempt: u32,
    /// What the call produced.
    pub outcome: CallOutcome,
    /// Cost the engine would charge for this call (the tool's step cost).
    pub cost_delta: f64,
}

/// Append-only sink for tool call records.
///
/// Implementations must serialize appends (single writer at a time).
pub trait TraceSink: Send + Sync {
    /// Identifier of the run this sink records; the engine reports the same
    /// id so a report and its trace can be correlated.
    fn run_id(&self) -> Uuid;

    /// Append one attempt record; the sink assigns the sequence number.
    fn append(&self, tool: &str, args: &ToolArgs, attempt: u32, outcome: CallOutcome, cost_delta: f64);

    /// Record how the run ended.
    fn set_terminal(&self, status: TerminalStatus);
}

#[derive(Debug, Default)]
struct TraceInner {
    records: Vec<ToolCallRecord>,
    terminal: Option<TerminalStatus>,
}

/// In-memory trace recorder.
///
/// The standard sink for library use and tests; external consumers snapshot
/// the records and serialize them however they like.
#[derive(Debug)]
pub struct InMemoryTrace {
    run_id: Uuid,
    inner: Mutex<TraceInner>,
}

impl InMemoryTrace {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            inner: Mutex::new(TraceInner::default()),
        }
    }

    /// Snapshot of all records appended so far, in sequence order.
    pub fn records(&self) -> Vec<ToolCallRecord> {
        self.inner.lock().expect("trace lock poisoned").records.clone()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("trace lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Terminal status, once the run has ended.
    pub fn terminal(&self) -> Option<TerminalStatus> {
        self.inner.lock().expect("trace lock poisoned").terminal
    }

    /// Records for a given tool name, in sequence order.
    pub fn records_for(&self, tool: &str) -> Vec<ToolCallRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.tool == tool)
            .collect()
    }
}

impl Default for InMemoryTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for InMemoryTrace {
    fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn append(&self, tool: &str, args: &ToolArgs, attempt: u32, outcome: CallOutcome, cost_delta: f64) {
        let mut inner = self.inner.lock().expect("trace lock poisoned");
        let seq = inner.records.len() as u64;
        inner.records.push(ToolCallRecord {
            seq,
            tool: tool.to_string(),
            args: args.clone(),
            attempt,
            outcome,
            cost_delta,
        });
    }

    fn set_terminal(&self, status: TerminalStatus) {
        self.inner.lock().expect("trace lock poisoned").terminal = Some(status);
    }
}
