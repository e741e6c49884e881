//! Lifecycle events and the broadcast bus that carries them.
//!
//! Every state change of a supervised process is published as an [`Event`]
//! on the [`Bus`]. Subscribers (logging, state tracking, user-defined) fan
//! out from a single bus listener owned by the supervisor.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
