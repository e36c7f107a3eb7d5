//! Search Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::heuristic::HeuristicMode;

/// Configuration for one search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether the heuristic blends in an external hint.
    pub mode: HeuristicMode,

    /// Weight of the hint in the blended estimate, in `[0, 1]`.
    pub hint_weight: f64,

    /// Maximum number of node expansions before terminating `Exhausted`.
    pub max_expansions: u64,

    /// Total attempts per tool call site, including the first
    /// (`1` = one attempt, no retries).
    pub max_retries: u32,

    /// Per-tool-call timeout in milliseconds (0 = no timeout). A timeout
    /// surfaces as a transient tool failure.
    pub per_call_timeout_ms: u64,

    /// Cost charged to `g` for each soft constraint a child newly violates.
    pub soft_penalty: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: HeuristicMode::NoHint,
            hint_weight: 0.5,
            max_expansions: 1_000,
            max_retries: 3,
            per_call_timeout_ms: 30_000,
            soft_penalty: 1.0,
        }
    }
}

impl SearchConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heuristic mode.
    pub fn with_mode(mut self, mode: HeuristicMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the hint weight, clamped to `[0, 1]`.
    pub fn with_hint_weight(mut self, weight: f64) -> Self {
        self.hint_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set the expansion budget.
    pub fn with_max_expansions(mut self, max: u64) -> Self {
        self.max_expansions = max;
        self
    }

    /// Set total attempts per tool call site.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max.max(1);
        self
    }

    /// Set the per-call timeout.
    pub fn with_per_call_timeout(mut self, timeout_ms: u64) -> Self {
        self.per_call_timeout_ms = timeout_ms;
        self
    }

    /// Set the soft-constraint violation penalty.
    pub fn with_soft_penalty(mut self, penalty: f64) -> Self {
        self.soft_penalty = penalty.max(0.0);
        self
    }

    /// Per-call timeout as a [`Duration`], `None` when disabled.
    pub fn per_call_timeout(&self) -> Option<Duration> {
        (self.per_call_timeout_ms > 0).then(|| Duration::from_millis(self.per_call_timeout_ms))
    }
}
