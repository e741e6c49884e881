//! Broadcast bus for runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that actors, the launcher,
//! and the supervisor can publish without blocking, while any number of
//! receivers observe the stream.
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event
//!   is simply dropped.
//! - Capacity is a single ring buffer shared by all receivers; a receiver
//!   that falls behind observes `RecvError::Lagged(n)` and skips the `n`
//!   oldest events.
//! - Events are not persisted.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
