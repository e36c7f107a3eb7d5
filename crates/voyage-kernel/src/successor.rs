//! Successor Generator
//!
//! Given a state, enumerates the applicable tool calls and the candidate
//! states each produces. Tool applications within one expansion are
//! dispatched concurrently (they share no mutable state) and the results are
//! folded back in on the single search thread after the whole batch
//! completes, so the frontier is never touched mid-expansion.
//!
//! Every attempted call — including retries and failures — is appended to
//! the trace before `expand` returns. Failures go through the
//! [`FailurePolicy`]: transient ones are retried with the same arguments,
//! permanent ones (and exhausted retries, and empty results) prune the call
//! without affecting the rest of the expansion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::constraint::Goal;
use crate::interrupt::SearchInterrupt;
use crate::policy::{FailureAction, FailurePolicy};
use crate::state::State;
use crate::tool::{Tool, ToolArgs, ToolFailure};
use crate::trace::{CallOutcome, TraceSink};

/// Expands states into finalized child states via the available tools.
pub struct SuccessorGenerator {
    tools: Vec<Arc<dyn Tool>>,
    trace: Arc<dyn TraceSink>,
    policy: FailurePolicy,
    per_call_timeout: Option<Duration>,
    soft_penalty: f64,
}

impl SuccessorGenerator {
    pub fn new(
        tools: Vec<Arc<dyn Tool>>,
        trace: Arc<dyn TraceSink>,
        policy: FailurePolicy,
        per_call_timeout: Option<Duration>,
        soft_penalty: f64,
    ) -> Self {
        Self {
            tools,
            trace,
            policy,
            per_call_timeout,
            soft_penalty,
        }
    }

    /// Expand `parent` through every applicable tool call.
    ///
    /// Returns finalized children (parent link, cost, constraints
    /// evaluated). Data-equal candidates within the batch collapse to the
    /// cheapest reach (first wins on ties); the trace still records every
    /// call. Hard-constraint pruning is the engine's job, not the
    /// generator's.
    pub async fn expand(
        &self,
        parent: &Arc<State>,
        goal: &Goal,
        interrupt: &SearchInterrupt,
    ) -> Vec<State> {
        let mut calls: Vec<(Arc<dyn Tool>, ToolArgs)> = Vec::new();
        for tool in &self.tools {
            if tool.preconditions(parent) {
                for args in tool.propose_args(parent, goal) {
                    calls.push((Arc::clone(tool), args));
                }
            }
        }

        // Fan-out: all calls of the batch run concurrently; fan-in below
        // happens strictly after every call has settled.
        let results = futures::future::join_all(
            calls
                .iter()
                .map(|(tool, args)| self.attempt_call(tool.as_ref(), args, parent, interrupt)),
        )
        .await;

        let mut children: Vec<State> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for ((tool, args), candidates) in calls.iter().zip(results) {
            let Some(candidates) = candidates else {
                continue;
            };
            for raw in candidates {
                let child = raw.into_child(
                    parent,
                    goal,
                    tool.step_cost(),
                    self.soft_penalty,
                    tool.name(),
                    args,
                );
                match index.get(&child.canonical_key()) {
                    // Data-equal sibling: keep the cheaper reach, first wins
                    // on ties.
                    Some(&at) if children[at].g() <= child.g() => {
                        tracing::debug!(tool = tool.name(), %args, "dropping data-equal sibling candidate");
                    }
                    Some(&at) => {
                        children[at] = child;
                    }
                    None => {
                        index.insert(child.canonical_key(), children.len());
                        children.push(child);
                    }
                }
            }
        }
        children
    }

    /// Run one call site to completion: dispatch, retry transient failures,
    /// record every attempt. Returns the candidate states on success, `None`
    /// when the call was pruned or cancellation was requested.
    async fn attempt_call(
        &self,
        tool: &dyn Tool,
        args: &ToolArgs,
        parent: &State,
        interrupt: &SearchInterrupt,
    ) -> Option<Vec<State>> {
        let mut attempt: u32 = 0;
        loop {
            if interrupt.check() {
                return None;
            }
            attempt += 1;

            match self.dispatch(tool, args, parent).await {
                Ok(candidates) if candidates.is_empty() => {
                    let failure = ToolFailure::empty_result(tool.name());
                    self.record_failure(tool, args, attempt, &failure);
                    return None;
                }
                Ok(candidates) => {
                    self.trace.append(
                        tool.name(),
                        args,
                        attempt,
                        CallOutcome::Expanded {
                            candidates: candidates.iter().map(State::snapshot).collect(),
                        },
                        tool.step_cost(),
                    );
                    return Some(candidates);
                }
                Err(failure) => {
                    self.record_failure(tool, args, attempt, &failure);
                    match self.policy.decide(&failure, attempt) {
                        FailureAction::Retry => continue,
                        FailureAction::Prune => {
                            tracing::debug!(
                                tool = tool.name(),
                                %args,
                                attempt,
                                error = %failure,
                                "pruning branch after tool failure"
                            );
                            return None;
                        }
                    }
                }
            }
        }
    }

    /// One dispatch, bounded by the per-call timeout. A timeout surfaces as
    /// a transient failure so the policy can decide on a retry.
    async fn dispatch(
        &self,
        tool: &dyn Tool,
        args: &ToolArgs,
        parent: &State,
    ) -> Result<Vec<State>, ToolFailure> {
        match self.per_call_timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.apply(parent, args)).await {
                Ok(result) => result,
                Err(_) => Err(ToolFailure::transient(format!(
                    "call to '{}' timed out after {}ms",
                    tool.name(),
                    limit.as_millis()
                ))),
            },
            None => tool.apply(parent, args).await,
        }
    }

    fn record_failure(&self, tool: &dyn Tool, args: &ToolArgs, attempt: u32, failure: &ToolFailure) {
        self.trace.append(
            tool.name(),
            args,
            attempt,
            CallOutcome::Failed {
                kind: failure.kind,
                message: failure.message.clone(),
            },
            tool.step_cost(),
        );
    }
}
