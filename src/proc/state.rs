//! Handle state for one supervised process instance.
//!
//! Each (spec, instance) pair has exactly one [`ProcessStatus`] record,
//! owned and mutated solely by its actor and published through a
//! [`tokio::sync::watch`] channel. Everyone else — status queries, the
//! registry, tests — sees copies.
//!
//! ## State machine
//! ```text
//! STOPPED ──start──► STARTING ──ready/window──► RUNNING
//!    ▲                   │                         │
//!    │                   │ spawn refused           │ exit detected
//!    │                   ▼                         ▼
//!    │                ERRORED ◄──budget spent── CRASHED ──policy+budget──► STARTING
//!    │                                             │
//!    └────────── stop requested ── STOPPING ◄──────┘ (stop wins over restart)
//! ```

use std::time::SystemTime;

/// Lifecycle state of one process instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Not running; either never started or stopped on request.
    Stopped,
    /// Spawned, waiting for readiness.
    Starting,
    /// Alive and considered ready.
    Running,
    /// Stop requested; termination sequence in progress.
    Stopping,
    /// Exited without a stop request.
    Crashed,
    /// Spawn refused by the OS, or restart budget exhausted.
    Errored,
}

impl ProcessState {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessState::Stopped => "stopped",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Stopping => "stopping",
            ProcessState::Crashed => "crashed",
            ProcessState::Errored => "errored",
        }
    }

    /// True while an OS process may exist for this handle.
    pub fn is_alive(&self) -> bool {
        matches!(
            self,
            ProcessState::Starting | ProcessState::Running | ProcessState::Stopping
        )
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Snapshot of one process instance's runtime record.
///
/// Handed out by copy; holding one never blocks or races the supervisor.
#[derive(Clone, Debug)]
pub struct ProcessStatus {
    /// Process name from the spec.
    pub name: String,
    /// Instance index (0-based).
    pub instance: u32,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// OS process id while alive.
    pub pid: Option<u32>,
    /// Restarts performed by the current actor run.
    pub restarts: u32,
    /// When the current/last OS process was spawned.
    pub started_at: Option<SystemTime>,
    /// Exit code from the most recent exit, when the child reported one.
    pub last_exit: Option<i32>,
}

impl ProcessStatus {
    /// Initial record for a freshly registered instance slot.
    pub(crate) fn new(name: &str, instance: u32) -> Self {
        Self {
            name: name.to_string(),
            instance,
            state: ProcessState::Stopped,
            pid: None,
            restarts: 0,
            started_at: None,
            last_exit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_covers_exactly_the_live_states() {
        assert!(ProcessState::Starting.is_alive());
        assert!(ProcessState::Running.is_alive());
        assert!(ProcessState::Stopping.is_alive());
        assert!(!ProcessState::Stopped.is_alive());
        assert!(!ProcessState::Crashed.is_alive());
        assert!(!ProcessState::Errored.is_alive());
    }

    #[test]
    fn fresh_status_is_stopped() {
        let s = ProcessStatus::new("web", 0);
        assert_eq!(s.state, ProcessState::Stopped);
        assert_eq!(s.restarts, 0);
        assert!(s.pid.is_none());
    }
}
