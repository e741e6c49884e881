//! Global runtime configuration.
//!
//! [`SupervisorConfig`] holds the knobs that belong to the supervisor as a
//! whole rather than to any single process: the shutdown grace window, the
//! event bus capacity, and the resident-memory sampling interval. Everything
//! per-process (restart policy, backoff, timeouts, memory ceiling) lives on
//! [`ProcessSpec`](crate::ProcessSpec).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use procvisor::SupervisorConfig;
//!
//! let mut cfg = SupervisorConfig::default();
//! cfg.grace = Duration::from_secs(10);
//! cfg.sample_interval = Duration::from_secs(2);
//!
//! assert_eq!(cfg.grace, Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Supervisor-wide configuration.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for processes to stop during graceful shutdown.
    pub grace: Duration,
    /// Capacity of the broadcast event bus.
    pub bus_capacity: usize,
    /// Interval between resident-memory samples for processes with a
    /// memory ceiling.
    pub sample_interval: Duration,
}

impl Default for SupervisorConfig {
    /// Provides a default configuration:
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `sample_interval = 5s`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            sample_interval: Duration::from_secs(5),
        }
    }
}

impl SupervisorConfig {
    /// Bus capacity clamped to a sane minimum.
    pub(crate) fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}
