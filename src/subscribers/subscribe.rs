//! Core subscriber trait.
//!
//! A subscriber is driven by a dedicated worker loop fed from a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block the
//!   publisher or other subscribers.
//! - Each subscriber declares its queue capacity via
//!   [`Subscribe::queue_capacity`]; on overflow, events for that
//!   subscriber are dropped with a diagnostic.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task; prefer async I/O and
/// cooperative waits over blocking.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue; events are dropped for this
    /// subscriber when it overflows.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
