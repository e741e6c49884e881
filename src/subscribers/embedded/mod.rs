//! Embedded subscribers shipped with the crate.

mod log;
mod state;

pub use log::EventLog;
pub use state::StateTracker;
