//! Runtime events emitted by the supervisor and process actors.
//!
//! [`EventKind`] classifies events into:
//! - **Lifecycle**: one process instance moving through its state machine
//!   (starting, ready, stopping, stopped, crashed, spawn failure);
//! - **Policy**: restart scheduling and exhaustion, memory-ceiling kills;
//! - **Registry**: processes added to or removed from supervision;
//! - **Shutdown**: supervisor-wide termination progress;
//! - **Subscriber**: fan-out diagnostics (subscriber panics).
//!
//! [`Event`] carries the metadata relevant to its kind: process name,
//! instance index, pid, attempt counter, exit code, resident memory,
//! backoff delay, and a human-readable reason.
//!
//! ## Ordering
//! Each event gets a globally unique, monotonically increasing `seq`.
//! Subscribers that receive events from independent queues can use `seq`
//! to restore the original order.
//!
//! ## Example
//! ```
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::ProcessCrashed)
//!     .with_proc("web")
//!     .with_instance(0)
//!     .with_exit_code(1)
//!     .with_reason("exited");
//!
//! assert_eq!(ev.kind, EventKind::ProcessCrashed);
//! assert_eq!(ev.proc.as_deref(), Some("web"));
//! assert_eq!(ev.exit_code, Some(1));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Process lifecycle ===
    /// An attempt to start a process instance has begun (state STARTING).
    ///
    /// Sets: `proc`, `instance`, `attempt`.
    ProcessStarting,

    /// The instance reached RUNNING (readiness observed, readiness window
    /// elapsed, or immediate policy).
    ///
    /// Sets: `proc`, `instance`, `pid`, `reason`.
    ProcessReady,

    /// A stop was requested and the termination sequence has begun
    /// (state STOPPING).
    ///
    /// Sets: `proc`, `instance`, `pid`.
    ProcessStopping,

    /// The instance stopped because it was asked to (state STOPPED).
    ///
    /// Sets: `proc`, `instance`, `exit_code` (if the child reported one).
    ProcessStopped,

    /// The instance exited without a stop request (state CRASHED).
    ///
    /// Sets: `proc`, `instance`, `exit_code`, `attempt` (restart count
    /// after this crash), `reason`.
    ProcessCrashed,

    /// The OS refused to create the process (state ERRORED).
    ///
    /// Sets: `proc`, `instance`, `reason`.
    SpawnFailed,

    // === Policy ===
    /// A RUNNING instance exceeded its resident-memory ceiling and will be
    /// terminated and treated as crashed.
    ///
    /// Sets: `proc`, `instance`, `pid`, `rss_bytes`.
    MemoryExceeded,

    /// A restart was scheduled after a crash or spawn failure.
    ///
    /// Sets: `proc`, `instance`, `attempt`, `delay_ms`, `reason`.
    BackoffScheduled,

    /// The restart budget is spent; the instance will not be restarted
    /// again (state ERRORED).
    ///
    /// Sets: `proc`, `instance`, `attempt`, `reason`.
    RestartsExhausted,

    // === Registry ===
    /// A process was placed under supervision.
    ///
    /// Sets: `proc`.
    ProcessAdded,

    /// A process was removed from supervision (after stop and cleanup).
    ///
    /// Sets: `proc`.
    ProcessRemoved,

    // === Shutdown ===
    /// Supervisor shutdown requested (OS signal or explicit call).
    ShutdownRequested,

    /// All processes stopped within the configured grace window.
    AllStoppedWithin,

    /// Grace window elapsed with processes still alive.
    GraceExceeded,

    // === Subscriber diagnostics ===
    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `proc` (subscriber name), `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// `seq` and `at` are always set; the remaining fields depend on the
/// [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Process name (or subscriber name for subscriber diagnostics).
    pub proc: Option<Arc<str>>,
    /// Instance index (0-based).
    pub instance: Option<u32>,
    /// OS process id.
    pub pid: Option<u32>,
    /// Attempt/restart counter, meaning per kind.
    pub attempt: Option<u32>,
    /// Exit code reported by the child, when it exited normally.
    pub exit_code: Option<i32>,
    /// Sampled resident memory in bytes.
    pub rss_bytes: Option<u64>,
    /// Backoff delay before the next attempt, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Human-readable reason (error text, "ready timeout", ...).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            proc: None,
            instance: None,
            pid: None,
            attempt: None,
            exit_code: None,
            rss_bytes: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a process (or subscriber) name.
    #[inline]
    pub fn with_proc(mut self, name: impl Into<Arc<str>>) -> Self {
        self.proc = Some(name.into());
        self
    }

    /// Attaches an instance index.
    #[inline]
    pub fn with_instance(mut self, instance: u32) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Attaches an OS process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches an attempt/restart counter.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches the child's exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a sampled resident memory size in bytes.
    #[inline]
    pub fn with_rss(mut self, bytes: u64) -> Self {
        self.rss_bytes = Some(bytes);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber panic diagnostic.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_proc(subscriber)
            .with_reason(info)
    }
}
