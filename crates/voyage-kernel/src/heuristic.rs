//! Heuristic Estimator
//!
//! Estimates remaining cost-to-goal from a state. The structural estimate
//! counts unassigned required slots and currently-violated hard constraints
//! with fixed weights; assuming each tool call resolves at most one slot, it
//! never overestimates the true number of remaining calls, so `NoHint`
//! search keeps A* optimality.
//!
//! `WithHint` blends in an externally supplied prior:
//! `h = structural × (1 − hint_weight) + hint × hint_weight`. The blend may
//! overestimate — hinted mode deliberately trades optimality guarantees for
//! plausible-path speed. If the hint source is unavailable the estimator
//! falls back to the structural estimate and flags the run as degraded
//! rather than aborting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::constraint::Goal;
use crate::state::State;

/// Whether the estimate incorporates an external hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicMode {
    NoHint,
    WithHint,
}

/// Failure of the external hint source.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum HintError {
    #[error("Hint source unavailable: {0}")]
    Unavailable(String),
    #[error("Hint source returned an invalid estimate: {0}")]
    Invalid(String),
}

/// External guidance consumed by the estimator (optional).
///
/// Implementations must be deterministic for identical `(state, goal)`
/// inputs if reproducible searches are required.
#[async_trait]
pub trait HintSource: Send + Sync {
    /// Estimate remaining cost-to-goal from the given state.
    async fn estimate_hint(&self, state: &State, goal: &Goal) -> Result<f64, HintError>;
}

/// Scores states for the frontier.
pub struct HeuristicEstimator {
    mode: HeuristicMode,
    hint_weight: f64,
    slot_weight: f64,
    constraint_weight: f64,
    hint: Option<Arc<dyn HintSource>>,
    degraded: AtomicBool,
}

impl HeuristicEstimator {
    /// Create an estimator. `hint_weight` is clamped to `[0, 1]`.
    pub fn new(mode: HeuristicMode, hint_weight: f64, hint: Option<Arc<dyn HintSource>>) -> Self {
        Self {
            mode,
            hint_weight: hint_weight.clamp(0.0, 1.0),
            slot_weight: 1.0,
            constraint_weight: 1.0,
            hint,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> HeuristicMode {
        self.mode
    }

    /// Whether any estimate in this run fell back to structural because the
    /// hint source failed.
    pub fn degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Purely structural estimate: unassigned required slots plus violated
    /// hard constraints, each with a fixed weight.
    pub fn structural(&self, state: &State, goal: &Goal) -> f64 {
        goal.unassigned_required(state) as f64 * self.slot_weight
            + goal.violated_hard(state) as f64 * self.constraint_weight
    }

    /// Estimate remaining cost-to-goal. Non-negative; zero at goal states.
    pub async fn estimate(&self, state: &State, goal: &Goal) -> f64 {
        if goal.is_satisfied(state) {
            return 0.0;
        }
        let structural = self.structural(state, goal);

        let hint = match (self.mode, &self.hint) {
            (HeuristicMode::WithHint, Some(source)) => match source.estimate_hint(state, goal).await {
                Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                Ok(value) => {
                    tracing::warn!(value, "hint source returned an unusable estimate, falling back to structural");
                    self.degraded.store(true, Ordering::Relaxed);
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "hint source failed, falling back to structural");
                    self.degraded.store(true, Ordering::Relaxed);
                    None
                }
            },
            (HeuristicMode::WithHint, None) => {
                self.degraded.store(true, Ordering::Relaxed);
                None
            }
            (HeuristicMode::NoHint, _) => None,
        };

        match hint {
            Some(h) => structural * (1.0 - self.hint_weight) + h * self.hint_weight,
            None => structural,
        }
    }
}
