//! Built-in tool capabilities.

pub mod travel;

pub use travel::{
    ConfirmBooking, SelectTransport, SetDestination, SetOrigin, SLOT_BOOKING, SLOT_DESTINATION,
    SLOT_ORIGIN, SLOT_TRANSPORT,
};
