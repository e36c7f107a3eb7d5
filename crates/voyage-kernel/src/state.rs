//! Plan State Snapshots
//!
//! A [`State`] is an immutable snapshot of planning progress: which plan
//! slots are assigned, the evaluated status of every goal constraint, the
//! accumulated path cost `g`, and a back-reference to the parent state plus
//! the tool call that produced it (used for path reconstruction only).
//!
//! States are never mutated after creation. Tools produce *raw* candidate
//! states via [`State::with_slot`]; the successor generator finalizes them
//! into children (parent link, cost increment, constraint evaluation) via
//! [`State::into_child`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::constraint::{ConstraintStatus, Goal};
use crate::tool::ToolArgs;

/// The value assigned to a plan slot.
///
/// Carries a primary text value plus optional string attribute tags, so
/// upstream collaborators can attach structured facts to a value (e.g. a
/// destination city tagged with its region) that constraints can predicate
/// on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValue {
    /// Primary textual value of the slot.
    pub text: String,
    /// Optional attribute tags (attribute name to value).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl SlotValue {
    /// Create a plain text value with no attributes.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: value.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Attach an attribute tag (builder pattern).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

/// Which tool call produced a state (path reconstruction bookkeeping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the tool that produced this state.
    pub tool: String,
    /// Arguments the tool was applied with.
    pub args: ToolArgs,
    /// Cost charged for the producing call (step cost + soft penalties).
    pub cost_delta: f64,
}

/// Immutable snapshot of plan progress.
///
/// Two states are considered equal for duplicate suppression iff their
/// assigned slots and their satisfied/violated constraint flags match —
/// path history (`g`, parent, provenance) is deliberately excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    slots: BTreeMap<String, SlotValue>,
    constraints: BTreeMap<String, ConstraintStatus>,
    g: f64,
    #[serde(skip)]
    parent: Option<Arc<State>>,
    provenance: Option<Provenance>,
}

impl State {
    /// Create an empty state: no slots assigned, zero accumulated cost.
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            constraints: BTreeMap::new(),
            g: 0.0,
            parent: None,
            provenance: None,
        }
    }

    /// Look up an assigned slot.
    pub fn get(&self, slot: &str) -> Option<&SlotValue> {
        self.slots.get(slot)
    }

    /// Returns `true` if the slot has a value.
    pub fn is_assigned(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    /// All assigned slots, in sorted order.
    pub fn slots(&self) -> &BTreeMap<String, SlotValue> {
        &self.slots
    }

    /// Evaluated status of a constraint by id.
    pub fn constraint_status(&self, id: &str) -> Option<&ConstraintStatus> {
        self.constraints.get(id)
    }

    /// All evaluated constraint statuses.
    pub fn constraints(&self) -> &BTreeMap<String, ConstraintStatus> {
        &self.constraints
    }

    /// Accumulated path cost.
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Parent state, if this state was produced by a tool call.
    pub fn parent(&self) -> Option<&Arc<State>> {
        self.parent.as_ref()
    }

    /// The tool call that produced this state, if any.
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Ids of the constraints currently violated in this state.
    pub fn violated(&self) -> impl Iterator<Item = &str> {
        self.constraints
            .iter()
            .filter(|(_, s)| matches!(s, ConstraintStatus::Violated))
            .map(|(id, _)| id.as_str())
    }

    /// Produce a raw candidate with one additional slot assignment.
    ///
    /// The result carries no parent link, provenance, or cost increment —
    /// the successor generator finalizes raw candidates into children.
    pub fn with_slot(&self, slot: impl Into<String>, value: impl Into<SlotValue>) -> State {
        let mut slots = self.slots.clone();
        slots.insert(slot.into(), value.into());
        State {
            slots,
            constraints: BTreeMap::new(),
            g: self.g,
            parent: None,
            provenance: None,
        }
    }

    /// Returns a copy with constraint statuses evaluated against the goal.
    ///
    /// Used for the initial state before the search starts; children are
    /// evaluated during finalization.
    pub fn evaluated(mut self, goal: &Goal) -> State {
        self.constraints = goal.evaluate(&self.slots);
        self
    }

    /// Finalize a raw candidate into a child of `parent`.
    ///
    /// Charges `step_cost` plus `soft_penalty` per soft constraint that is
    /// violated in the child but was not violated in the parent, evaluates
    /// all constraints against the goal, and records provenance. Costs are
    /// clamped to keep `g` monotonically non-decreasing.
    pub(crate) fn into_child(
        self,
        parent: &Arc<State>,
        goal: &Goal,
        step_cost: f64,
        soft_penalty: f64,
        tool: &str,
        args: &ToolArgs,
    ) -> State {
        let constraints = goal.evaluate(&self.slots);
        let newly_violated_soft = goal
            .soft_constraints()
            .filter(|c| {
                matches!(constraints.get(c.id()), Some(ConstraintStatus::Violated))
                    && !matches!(
                        parent.constraints.get(c.id()),
                        Some(ConstraintStatus::Violated)
                    )
            })
            .count();

        let cost_delta =
            step_cost.max(0.0) + soft_penalty.max(0.0) * newly_violated_soft as f64;
        let g = parent.g + cost_delta;
        debug_assert!(g >= parent.g);

        State {
            slots: self.slots,
            constraints,
            g,
            parent: Some(Arc::clone(parent)),
            provenance: Some(Provenance {
                tool: tool.to_string(),
                args: args.clone(),
                cost_delta,
            }),
        }
    }

    /// Deterministic key over assigned slots and satisfied/violated flags.
    ///
    /// Pending constraints are excluded: a pending flag only reflects which
    /// slots are unassigned, which the slot part already captures.
    pub fn canonical_key(&self) -> String {
        let mut key = String::new();
        for (slot, value) in &self.slots {
            key.push_str(slot);
            key.push('=');
            key.push_str(&value.text);
            for (k, v) in &value.attrs {
                key.push('@');
                key.push_str(k);
                key.push(':');
                key.push_str(v);
            }
            key.push(';');
        }
        key.push('|');
        for (id, status) in &self.constraints {
            match status {
                ConstraintStatus::Satisfied => {
                    key.push_str(id);
                    key.push_str("=S;");
                }
                ConstraintStatus::Violated => {
                    key.push_str(id);
                    key.push_str("=V;");
                }
                ConstraintStatus::Pending => {}
            }
        }
        key
    }

    /// Flat snapshot of the assigned slots (for trace records).
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.slots
            .iter()
            .map(|(k, v)| (k.clone(), v.text.clone()))
            .collect()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for State {}

impl std::hash::Hash for State {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State(")?;
        let mut first = true;
        for (slot, value) in &self.slots {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", slot, value)?;
            first = false;
        }
        write!(f, ")")
    }
}
