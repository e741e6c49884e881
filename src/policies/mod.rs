//! Restart, backoff, and jitter policies.
//!
//! - [`RestartPolicy`] decides *whether* an exited process comes back.
//! - [`BackoffPolicy`] decides *when* (delay growth between restarts).
//! - [`JitterPolicy`] de-synchronizes those delays across processes.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
