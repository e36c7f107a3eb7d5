//! Travel Booking Tool Set
//!
//! The built-in capability set for turning a travel request into a booked
//! trip: set an origin, pick a destination, choose a transport mode, and
//! confirm. These are in-process tools (no network); production deployments
//! swap in external tools behind the same [`Tool`] trait.
//!
//! Candidate proposal is the tool's job: `SetDestination` is nondeterministic
//! and returns one candidate state per configured destination, each tagged
//! with its region so goal constraints can predicate on it.

use async_trait::async_trait;

use crate::constraint::Goal;
use crate::state::{SlotValue, State};
use crate::tool::{Tool, ToolArgs, ToolFailure};

pub const SLOT_ORIGIN: &str = "origin";
pub const SLOT_DESTINATION: &str = "destination";
pub const SLOT_TRANSPORT: &str = "transport";
pub const SLOT_BOOKING: &str = "booking";

/// Set the origin city for travel.
pub struct SetOrigin {
    city: String,
}

impl SetOrigin {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

#[async_trait]
impl Tool for SetOrigin {
    fn name(&self) -> &str {
        "set_origin"
    }

    fn description(&self) -> &str {
        "Set the origin city for travel"
    }

    fn preconditions(&self, state: &State) -> bool {
        !state.is_assigned(SLOT_ORIGIN)
    }

    fn propose_args(&self, _state: &State, _goal: &Goal) -> Vec<ToolArgs> {
        vec![ToolArgs::of([self.city.clone()])]
    }

    async fn apply(&self, state: &State, args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
        let city = args
            .first()
            .ok_or_else(|| ToolFailure::permanent("set_origin requires a city argument"))?;
        Ok(vec![state.with_slot(SLOT_ORIGIN, city)])
    }
}

/// Set the destination city.
///
/// Nondeterministic: yields one candidate state per configured destination,
/// tagged with its region.
pub struct SetDestination {
    candidates: Vec<(String, String)>,
}

impl SetDestination {
    /// `candidates` are `(city, region)` pairs.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            candidates: candidates
                .into_iter()
                .map(|(c, r)| (c.into(), r.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl Tool for SetDestination {
    fn name(&self) -> &str {
        "set_destination"
    }

    fn description(&self) -> &str {
        "Choose a destination city from the candidate list"
    }

    fn preconditions(&self, state: &State) -> bool {
        state.is_assigned(SLOT_ORIGIN) && !state.is_assigned(SLOT_DESTINATION)
    }

    async fn apply(&self, state: &State, _args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
        Ok(self
            .candidates
            .iter()
            .map(|(city, region)| {
                state.with_slot(
                    SLOT_DESTINATION,
                    SlotValue::text(city.clone()).with_attr("region", region.clone()),
                )
            })
            .collect())
    }
}

/// Choose a transport mode (e.g. train, flight).
pub struct SelectTransport {
    modes: Vec<String>,
}

impl SelectTransport {
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modes: modes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for SelectTransport {
    fn default() -> Self {
        Self::new(["train", "flight", "bus"])
    }
}

#[async_trait]
impl Tool for SelectTransport {
    fn name(&self) -> &str {
        "select_transport"
    }

    fn description(&self) -> &str {
        "Choose a transport mode (e.g. train, flight)"
    }

    fn step_cost(&self) -> f64 {
        1.2
    }

    fn preconditions(&self, state: &State) -> bool {
        state.is_assigned(SLOT_DESTINATION) && !state.is_assigned(SLOT_TRANSPORT)
    }

    fn propose_args(&self, _state: &State, _goal: &Goal) -> Vec<ToolArgs> {
        self.modes.iter().map(|m| ToolArgs::of([m.clone()])).collect()
    }

    async fn apply(&self, state: &State, args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
        let mode = args
            .first()
            .ok_or_else(|| ToolFailure::permanent("select_transport requires a mode argument"))?;
        Ok(vec![state.with_slot(SLOT_TRANSPORT, mode)])
    }
}

/// Finalize the booking and mark it as confirmed.
pub struct ConfirmBooking;

#[async_trait]
impl Tool for ConfirmBooking {
    fn name(&self) -> &str {
        "confirm_booking"
    }

    fn description(&self) -> &str {
        "Finalize the booking and mark as confirmed"
    }

    fn step_cost(&self) -> f64 {
        2.0
    }

    fn preconditions(&self, state: &State) -> bool {
        state.is_assigned(SLOT_TRANSPORT) && !state.is_assigned(SLOT_BOOKING)
    }

    async fn apply(&self, state: &State, _args: &ToolArgs) -> Result<Vec<State>, ToolFailure> {
        Ok(vec![state.with_slot(SLOT_BOOKING, "confirmed")])
    }
}
