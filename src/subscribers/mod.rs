//! Event subscribers: the observability extension point.
//!
//! Implement [`Subscribe`] to hook into the runtime event stream; the
//! [`SubscriberSet`] fans events out to every subscriber through bounded
//! per-subscriber queues, isolating slow or panicking subscribers from
//! the supervisor and from each other.
//!
//! Two embedded subscribers ship with the crate:
//! - [`EventLog`] — renders events through `tracing`;
//! - [`StateTracker`] — maintains a queryable map of instance states.

mod embedded;
mod set;
mod subscribe;

pub use embedded::{EventLog, StateTracker};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
