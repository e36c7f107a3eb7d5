//! Best-First Search Engine
//!
//! A*-style search over plan states: a frontier ordered by `f = g + h`, a
//! visited map for duplicate suppression, and deterministic tie-breaking
//! (lowest `f`, then lowest `g`, then earliest insertion sequence) so that
//! identical inputs replay to identical plans and traces.
//!
//! Tool failures and constraint violations never escape this loop — the
//! failure policy and hard-constraint pruning handle them branch-locally.
//! The caller always receives a [`SearchReport`] with a terminal status, and
//! the best-so-far path where the run ended without a goal.

use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::constraint::Goal;
use crate::error::PlanResult;
use crate::heuristic::{HeuristicEstimator, HintSource};
use crate::interrupt::SearchInterrupt;
use crate::plan::Plan;
use crate::policy::FailurePolicy;
use crate::state::State;
use crate::successor::SuccessorGenerator;
use crate::tool::Tool;
use crate::trace::{TerminalStatus, TraceSink};

/// Search-internal wrapper around a state.
///
/// Ordering is inverted so the max-heap frontier pops the best node: lowest
/// `f` first, ties by lowest `g`, then by earliest insertion sequence.
#[derive(Debug, Clone)]
struct Node {
    f: f64,
    g: f64,
    seq: u64,
    state: Arc<State>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g && self.seq == other.seq
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// What a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Identifier of this run, shared with the trace sink's records.
    pub run_id: Uuid,
    /// How the run ended.
    pub status: TerminalStatus,
    /// The goal path on `Success`; the best-so-far non-goal path on
    /// `Exhausted`/`Cancelled`; `None` on `Unreachable`.
    pub plan: Option<Plan>,
    /// Number of nodes actually expanded.
    pub expansions: u64,
    /// `true` if any heuristic estimate fell back because the hint source
    /// was unavailable.
    pub degraded: bool,
}

impl SearchReport {
    pub fn is_success(&self) -> bool {
        self.status == TerminalStatus::Success
    }
}

/// A*-style best-first planner over a set of tool capabilities.
pub struct SearchEngine {
    generator: SuccessorGenerator,
    estimator: HeuristicEstimator,
    config: SearchConfig,
    trace: Arc<dyn TraceSink>,
    interrupt: SearchInterrupt,
}

impl SearchEngine {
    /// Create an engine over the given tools, writing the audit trail to
    /// `trace`.
    pub fn new(tools: Vec<Arc<dyn Tool>>, config: SearchConfig, trace: Arc<dyn TraceSink>) -> Self {
        Self::with_hint_source(tools, config, trace, None)
    }

    /// Create an engine with an external hint source for `WithHint` mode.
    pub fn with_hint_source(
        tools: Vec<Arc<dyn Tool>>,
        config: SearchConfig,
        trace: Arc<dyn TraceSink>,
        hint: Option<Arc<dyn HintSource>>,
    ) -> Self {
        let generator = SuccessorGenerator::new(
            tools,
            Arc::clone(&trace),
            FailurePolicy::new(config.max_retries),
            config.per_call_timeout(),
            config.soft_penalty,
        );
        let estimator = HeuristicEstimator::new(config.mode, config.hint_weight, hint);
        Self {
            generator,
            estimator,
            config,
            trace,
            interrupt: SearchInterrupt::new(),
        }
    }

    /// Handle for cancelling a running search from outside.
    pub fn interrupt_handle(&self) -> SearchInterrupt {
        self.interrupt.clone()
    }

    /// Run the search from `initial` toward `goal`.
    ///
    /// Only goal validation can fail here; every runtime outcome — including
    /// budget exhaustion and cancellation — is a terminal status on the
    /// report, carrying the best-so-far path where applicable.
    pub async fn run(&self, initial: State, goal: &Goal) -> PlanResult<SearchReport> {
        goal.validate().map_err(error_stack::Report::new)?;

        let run_id = self.trace.run_id();
        let initial = initial.evaluated(goal);

        let mut frontier: BinaryHeap<Node> = BinaryHeap::new();
        let mut visited: HashMap<String, f64> = HashMap::new();
        let mut seq: u64 = 0;
        let mut expansions: u64 = 0;

        let h0 = self.estimator.estimate(&initial, goal).await;
        let root = Node {
            f: initial.g() + h0,
            g: initial.g(),
            seq,
            state: Arc::new(initial),
        };
        seq += 1;

        // Best-so-far by lowest f observed; ties break toward the deeper
        // state so a budget-limited run still returns a useful prefix.
        let mut best_f = root.f;
        let mut best_g = root.g;
        let mut best_state = Arc::clone(&root.state);
        frontier.push(root);

        let report = loop {
            if self.interrupt.check() {
                break self.finish(
                    run_id,
                    TerminalStatus::Cancelled,
                    Some(Plan::from_state(&best_state)),
                    expansions,
                );
            }

            let Some(node) = frontier.pop() else {
                break self.finish(run_id, TerminalStatus::Unreachable, None, expansions);
            };

            if goal.is_satisfied(&node.state) {
                break self.finish(
                    run_id,
                    TerminalStatus::Success,
                    Some(Plan::from_state(&node.state)),
                    expansions,
                );
            }

            let key = node.state.canonical_key();
            if let Some(&g) = visited.get(&key) {
                if g <= node.g {
                    // Duplicate: this state was already expanded at least as
                    // cheaply, never re-expand.
                    continue;
                }
            }

            if expansions >= self.config.max_expansions {
                break self.finish(
                    run_id,
                    TerminalStatus::Exhausted,
                    Some(Plan::from_state(&best_state)),
                    expansions,
                );
            }

            visited.insert(key, node.g);
            expansions += 1;
            tracing::debug!(expansions, f = node.f, g = node.g, state = %node.state, "expanding node");

            let children = self.generator.expand(&node.state, goal, &self.interrupt).await;

            for child in children {
                if goal.violates_hard(&child) {
                    // Hard constraints are absolute: never enqueued.
                    tracing::debug!(state = %child, "pruning child with violated hard constraint");
                    continue;
                }
                if let Some(&g) = visited.get(&child.canonical_key()) {
                    if g <= child.g() {
                        continue;
                    }
                }
                let h = self.estimator.estimate(&child, goal).await;
                let child_node = Node {
                    f: child.g() + h,
                    g: child.g(),
                    seq,
                    state: Arc::new(child),
                };
                seq += 1;
                if child_node.f < best_f || (child_node.f == best_f && child_node.g > best_g) {
                    best_f = child_node.f;
                    best_g = child_node.g;
                    best_state = Arc::clone(&child_node.state);
                }
                frontier.push(child_node);
            }
        };

        Ok(report)
    }

    fn finish(
        &self,
        run_id: Uuid,
        status: TerminalStatus,
        plan: Option<Plan>,
        expansions: u64,
    ) -> SearchReport {
        self.trace.set_terminal(status);
        tracing::info!(
            %run_id,
            ?status,
            expansions,
            plan_len = plan.as_ref().map(Plan::len).unwrap_or(0),
            "search finished"
        );
        SearchReport {
            run_id,
            status,
            plan,
            expansions,
            degraded: self.estimator.degraded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, SlotPredicate};
    use crate::tool::{ToolArgs, ToolFailure};
    use crate::trace::InMemoryTrace;
    use async_trait::async_trait;

    struct AssignTool {
        name: &'static str,
        slot: &'static str,
        values: Vec<&'static str>,
        cost: f64,
    }

    #[async_trait]
    impl Tool for AssignTool {
        fn name(&self) -> &str {
            self.name
        }
        fn step_cost(&self) -> f64 {
            self.cost
        }
        fn preconditions(&self, state: &State) -> bool {
            !state.is_assigned(self.slot)
        }
        fn propose_args(&self, _state: &State, _goal: &Goal) -> Vec<ToolArgs> {
            self.values.iter().map(|v| ToolArgs::of([*v])).collect()
        }
        async fn apply(&self, state: &State, args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
            Ok(vec![state.with_slot(self.slot, args.first().unwrap_or(""))])
        }
    }

    fn node(f: f64, g: f64, seq: u64) -> Node {
        Node {
            f,
            g,
            seq,
            state: Arc::new(State::new()),
        }
    }

    #[test]
    fn frontier_pops_lowest_f_then_lowest_g_then_earliest_seq() {
        let mut frontier = BinaryHeap::new();
        frontier.push(node(2.0, 1.0, 0));
        frontier.push(node(1.0, 1.0, 3));
        frontier.push(node(1.0, 0.5, 4));
        frontier.push(node(1.0, 0.5, 1));

        let order: Vec<u64> = std::iter::from_fn(|| frontier.pop().map(|n| n.seq)).collect();
        assert_eq!(order, vec![1, 4, 3, 0]);
    }

    #[tokio::test]
    async fn finds_the_cheapest_path_without_hints() {
        // Two ways to assign "x": cost 5.0 and cost 1.0. A* must pick 1.0.
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(
            vec![
                Arc::new(AssignTool { name: "expensive", slot: "x", values: vec!["v"], cost: 5.0 }),
                Arc::new(AssignTool { name: "cheap", slot: "x", values: vec!["v"], cost: 1.0 }),
            ],
            SearchConfig::default(),
            trace,
        );
        let goal = Goal::new().require("x");

        let report = engine.run(State::new(), &goal).await.unwrap();
        assert!(report.is_success());
        let plan = report.plan.unwrap();
        assert_eq!(plan.tool_sequence(), vec!["cheap"]);
        assert_eq!(plan.total_cost(), 1.0);
    }

    #[tokio::test]
    async fn no_state_is_expanded_twice() {
        // Both orders of assigning a and b converge on the same state; the
        // merged state must only be expanded once.
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(
            vec![
                Arc::new(AssignTool { name: "set_a", slot: "a", values: vec!["1"], cost: 1.0 }),
                Arc::new(AssignTool { name: "set_b", slot: "b", values: vec!["1"], cost: 1.0 }),
                Arc::new(AssignTool { name: "set_c", slot: "c", values: vec!["1"], cost: 1.0 }),
            ],
            SearchConfig::default(),
            trace,
        );
        let goal = Goal::new().require("a").require("b").require("c");

        let report = engine.run(State::new(), &goal).await.unwrap();
        assert!(report.is_success());
        // Distinct reachable non-goal states: {}, a, b, c, ab, ac, bc = 7.
        // One expansion each, at most.
        assert!(report.expansions <= 7, "expanded {} times", report.expansions);
    }

    #[tokio::test]
    async fn unreachable_when_no_tool_can_satisfy_a_hard_constraint() {
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(
            vec![Arc::new(AssignTool { name: "set_x", slot: "x", values: vec!["wrong"], cost: 1.0 })],
            SearchConfig::default(),
            trace,
        );
        let goal = Goal::new().require("x").constrain(Constraint::hard(
            "x-right",
            "x",
            SlotPredicate::Equals("right".into()),
        ));

        let report = engine.run(State::new(), &goal).await.unwrap();
        assert_eq!(report.status, TerminalStatus::Unreachable);
        assert!(report.plan.is_none());
    }

    #[tokio::test]
    async fn invalid_goal_is_rejected_before_searching() {
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(vec![], SearchConfig::default(), trace.clone());
        let goal = Goal::new().require("x").require("x");

        assert!(engine.run(State::new(), &goal).await.is_err());
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn report_carries_the_trace_run_id() {
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(
            vec![Arc::new(AssignTool { name: "set_x", slot: "x", values: vec!["v"], cost: 1.0 })],
            SearchConfig::default(),
            trace.clone(),
        );
        let goal = Goal::new().require("x");

        let report = engine.run(State::new(), &goal).await.unwrap();
        assert_eq!(report.run_id, trace.run_id());
    }

    #[tokio::test]
    async fn soft_violations_cost_but_do_not_block() {
        let trace = Arc::new(InMemoryTrace::new());
        let engine = SearchEngine::new(
            vec![Arc::new(AssignTool {
                name: "set_transport",
                slot: "transport",
                values: vec!["flight", "bus"],
                cost: 1.0,
            })],
            SearchConfig::default(),
            trace,
        );
        let goal = Goal::new().require("transport").constrain(Constraint::soft(
            "prefer-bus",
            "transport",
            SlotPredicate::Equals("bus".into()),
        ));

        let report = engine.run(State::new(), &goal).await.unwrap();
        assert!(report.is_success());
        let plan = report.plan.unwrap();
        // The bus branch costs 1.0, the flight branch 1.0 + 1.0 penalty.
        assert_eq!(plan.steps[0].args, ToolArgs::of(["bus"]));
        assert_eq!(plan.total_cost(), 1.0);
    }
}
