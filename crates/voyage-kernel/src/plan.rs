//! Plan Result
//!
//! The ordered tool-call sequence from the initial state to the state a
//! search ended on, reconstructed from the parent chain. Owned by the caller
//! once returned.

use serde::{Deserialize, Serialize};

use crate::state::State;
use crate::tool::ToolArgs;

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Tool that was applied.
    pub tool: String,
    /// Arguments it was applied with.
    pub args: ToolArgs,
    /// Cost charged for this step.
    pub cost_delta: f64,
}

/// An ordered tool-call sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Reconstruct the path from the initial state to `state` by walking the
    /// parent chain.
    pub fn from_state(state: &State) -> Self {
        let mut steps = Vec::new();
        let mut current = Some(state);
        while let Some(s) = current {
            if let Some(p) = s.provenance() {
                steps.push(PlanStep {
                    tool: p.tool.clone(),
                    args: p.args.clone(),
                    cost_delta: p.cost_delta,
                });
            }
            current = s.parent().map(|p| p.as_ref());
        }
        steps.reverse();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of step costs; equals the `g` of the final state.
    pub fn total_cost(&self) -> f64 {
        self.steps.iter().map(|s| s.cost_delta).sum()
    }

    /// Tool names in order, for quick assertions and display.
    pub fn tool_sequence(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.tool.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Goal;
    use std::sync::Arc;

    #[test]
    fn reconstructs_the_path_in_order() {
        let goal = Goal::new().require("origin").require("destination");
        let root = Arc::new(State::new().evaluated(&goal));
        let a = Arc::new(root.with_slot("origin", "Boston").into_child(
            &root,
            &goal,
            1.0,
            1.0,
            "set_origin",
            &ToolArgs::of(["Boston"]),
        ));
        let b = a.with_slot("destination", "Oslo").into_child(
            &a,
            &goal,
            1.2,
            1.0,
            "set_destination",
            &ToolArgs::of(["Oslo"]),
        );

        let plan = Plan::from_state(&b);
        assert_eq!(plan.tool_sequence(), vec!["set_origin", "set_destination"]);
        assert!((plan.total_cost() - 2.2).abs() < 1e-9);
        assert!((plan.total_cost() - b.g()).abs() < 1e-9);
    }

    #[test]
    fn root_state_yields_an_empty_plan() {
        let plan = Plan::from_state(&State::new());
        assert!(plan.is_empty());
        assert_eq!(plan.total_cost(), 0.0);
    }
}
