//! Goal & Constraint Model
//!
//! A [`Goal`] is the structured target the search drives toward: a set of
//! required slots plus a set of [`Constraint`]s over slot values. Constraints
//! are classified **hard** (must hold at goal; a violation prunes the branch
//! immediately) or **soft** (penalized in path cost, never disqualifying).
//!
//! Natural-language parsing of user requests into a `Goal` happens upstream;
//! this module only defines the structured form and its evaluation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::PlannerError;
use crate::state::{SlotValue, State};

/// Hard constraints disqualify a branch on violation; soft constraints only
/// add cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Hard,
    Soft,
}

/// Evaluated status of a constraint against a concrete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintStatus {
    /// The constrained slot is not assigned yet.
    Pending,
    Satisfied,
    Violated,
}

/// Structured predicate over a single slot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotPredicate {
    /// The slot's text must equal the given value.
    Equals(String),
    /// The slot's text must be one of the given values.
    OneOf(Vec<String>),
    /// A named attribute of the slot value must equal the given value.
    AttrEquals { key: String, value: String },
    /// The slot merely has to be assigned.
    Assigned,
}

impl SlotPredicate {
    /// Check the predicate against an assigned slot value.
    pub fn check(&self, value: &SlotValue) -> bool {
        match self {
            SlotPredicate::Equals(expected) => value.text == *expected,
            SlotPredicate::OneOf(options) => options.iter().any(|o| *o == value.text),
            SlotPredicate::AttrEquals { key, value: expected } => {
                value.attr(key) == Some(expected.as_str())
            }
            SlotPredicate::Assigned => true,
        }
    }
}

/// A single constraint: a predicate over one slot, tagged hard or soft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    id: String,
    slot: String,
    predicate: SlotPredicate,
    kind: ConstraintKind,
}

impl Constraint {
    /// Create a hard constraint.
    pub fn hard(id: impl Into<String>, slot: impl Into<String>, predicate: SlotPredicate) -> Self {
        Self {
            id: id.into(),
            slot: slot.into(),
            predicate,
            kind: ConstraintKind::Hard,
        }
    }

    /// Create a soft constraint.
    pub fn soft(id: impl Into<String>, slot: impl Into<String>, predicate: SlotPredicate) -> Self {
        Self {
            id: id.into(),
            slot: slot.into(),
            predicate,
            kind: ConstraintKind::Soft,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Evaluate against a slot assignment map.
    pub fn evaluate(&self, slots: &BTreeMap<String, SlotValue>) -> ConstraintStatus {
        match slots.get(&self.slot) {
            None => ConstraintStatus::Pending,
            Some(value) if self.predicate.check(value) => ConstraintStatus::Satisfied,
            Some(_) => ConstraintStatus::Violated,
        }
    }
}

/// The structured goal the search drives toward.
///
/// Produced upstream from the raw user request. The engine treats it as a
/// pure predicate: all required slots assigned and all hard constraints
/// satisfied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goal {
    required_slots: Vec<String>,
    constraints: Vec<Constraint>,
}

impl Goal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a slot as required at goal (builder pattern).
    pub fn require(mut self, slot: impl Into<String>) -> Self {
        self.required_slots.push(slot.into());
        self
    }

    /// Add a constraint (builder pattern).
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn required_slots(&self) -> &[String] {
        &self.required_slots
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Iterate the soft constraints only.
    pub fn soft_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Soft)
    }

    /// Iterate the hard constraints only.
    pub fn hard_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::Hard)
    }

    /// Check the goal for structural problems before searching.
    ///
    /// Rejects duplicate required slots, duplicate constraint ids, and
    /// constraints on slots that are empty or not required.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let unique_slots: HashSet<&str> =
            self.required_slots.iter().map(String::as_str).collect();
        if unique_slots.len() != self.required_slots.len() {
            return Err(PlannerError::Validation(
                "Goal lists a required slot more than once".into(),
            ));
        }

        let unique_ids: HashSet<&str> = self.constraints.iter().map(|c| c.id.as_str()).collect();
        if unique_ids.len() != self.constraints.len() {
            return Err(PlannerError::Validation(
                "Goal contains duplicate constraint ids".into(),
            ));
        }

        for constraint in &self.constraints {
            if constraint.slot.is_empty() {
                return Err(PlannerError::Validation(format!(
                    "Constraint '{}' has an empty slot name",
                    constraint.id
                )));
            }
            if !unique_slots.contains(constraint.slot.as_str()) {
                return Err(PlannerError::Validation(format!(
                    "Constraint '{}' references slot '{}' which is not required",
                    constraint.id, constraint.slot
                )));
            }
        }

        Ok(())
    }

    /// Evaluate every constraint against a slot assignment map.
    pub fn evaluate(&self, slots: &BTreeMap<String, SlotValue>) -> BTreeMap<String, ConstraintStatus> {
        self.constraints
            .iter()
            .map(|c| (c.id.clone(), c.evaluate(slots)))
            .collect()
    }

    /// The goal predicate: all required slots assigned and every hard
    /// constraint satisfied.
    pub fn is_satisfied(&self, state: &State) -> bool {
        self.required_slots.iter().all(|s| state.is_assigned(s))
            && self.hard_constraints().all(|c| {
                matches!(
                    state.constraint_status(c.id()),
                    Some(ConstraintStatus::Satisfied)
                )
            })
    }

    /// Count required slots the state has not assigned yet.
    pub fn unassigned_required(&self, state: &State) -> usize {
        self.required_slots
            .iter()
            .filter(|s| !state.is_assigned(s))
            .count()
    }

    /// Count hard constraints the state currently violates.
    pub fn violated_hard(&self, state: &State) -> usize {
        self.hard_constraints()
            .filter(|c| {
                matches!(
                    state.constraint_status(c.id()),
                    Some(ConstraintStatus::Violated)
                )
            })
            .count()
    }

    /// Returns `true` if the state violates any hard constraint.
    pub fn violates_hard(&self, state: &State) -> bool {
        self.violated_hard(state) > 0
    }
}
