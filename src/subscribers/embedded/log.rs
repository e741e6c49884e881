//! EventLog — renders runtime events through `tracing`.
//!
//! Attach it to get a readable account of everything the supervisor does:
//!
//! ```text
//! INFO  starting proc=web instance=0 attempt=1
//! INFO  ready proc=web instance=0 pid=4242 reason=spawned
//! WARN  crashed proc=web instance=0 exit_code=1 restarts=1
//! INFO  backoff proc=web instance=0 delay_ms=200
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs every event at an appropriate level.
#[derive(Default)]
pub struct EventLog;

impl EventLog {
    /// Constructs a new [`EventLog`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, e: &Event) {
        let proc = e.proc.as_deref().unwrap_or("-");
        let instance = e.instance.unwrap_or(0);
        match e.kind {
            EventKind::ProcessStarting => {
                info!(proc, instance, attempt = e.attempt, "starting");
            }
            EventKind::ProcessReady => {
                info!(proc, instance, pid = e.pid, reason = e.reason.as_deref(), "ready");
            }
            EventKind::ProcessStopping => {
                info!(proc, instance, pid = e.pid, "stopping");
            }
            EventKind::ProcessStopped => {
                info!(proc, instance, exit_code = e.exit_code, "stopped");
            }
            EventKind::ProcessCrashed => {
                warn!(
                    proc,
                    instance,
                    exit_code = e.exit_code,
                    restarts = e.attempt,
                    reason = e.reason.as_deref(),
                    "crashed"
                );
            }
            EventKind::SpawnFailed => {
                error!(proc, instance, reason = e.reason.as_deref(), "spawn failed");
            }
            EventKind::MemoryExceeded => {
                warn!(proc, instance, pid = e.pid, rss_bytes = e.rss_bytes, "memory ceiling exceeded");
            }
            EventKind::BackoffScheduled => {
                info!(proc, instance, attempt = e.attempt, delay_ms = e.delay_ms, "backoff");
            }
            EventKind::RestartsExhausted => {
                error!(proc, instance, restarts = e.attempt, "restart budget exhausted");
            }
            EventKind::ProcessAdded => {
                info!(proc, "added");
            }
            EventKind::ProcessRemoved => {
                info!(proc, "removed");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!("all processes stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!("shutdown grace exceeded");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = proc, reason = e.reason.as_deref(), "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "EventLog"
    }
}
