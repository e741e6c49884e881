//! Non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] delivers each [`Event`] to every subscriber without
//! awaiting any of them:
//!
//! ```text
//!    emit(&Event)
//!        ├────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! ## Rules
//! - `emit` returns immediately; per-subscriber order is FIFO.
//! - A full or closed queue drops the event for that subscriber only
//!   (diagnosed once per subscriber per run).
//! - A panicking subscriber is caught and reported on the bus; the worker
//!   keeps running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::{Bus, Event};

use super::Subscribe;

struct Channel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
    overflow_reported: AtomicBool,
}

/// Fan-out set with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<Channel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// `bus` is used to report subscriber panics as events.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        warn!(subscriber = sub.name(), "subscriber panicked");
                        bus.publish(Event::subscriber_panicked(
                            sub.name(),
                            format!("{panic:?}"),
                        ));
                    }
                }
            });

            channels.push(Channel {
                name,
                sender: tx,
                overflow_reported: AtomicBool::new(false),
            });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers without blocking.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            if channel.sender.try_send(Arc::clone(&ev)).is_err()
                && !channel.overflow_reported.swap(true, Ordering::Relaxed)
            {
                warn!(subscriber = channel.name, "subscriber queue overflowed; dropping events");
            }
        }
    }

    /// Closes all queues and waits for the workers to drain.
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no subscribers are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
