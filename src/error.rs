//! Error types used by the procvisor runtime.
//!
//! Three enums, matching the three places things go wrong:
//!
//! - [`SpecError`] — a process specification failed validation at load time.
//!   Fatal: the supervisor refuses to start with a bad spec set.
//! - [`RuntimeError`] — the supervision runtime itself failed (unknown
//!   process name in a command, shutdown grace exceeded). Reported to the
//!   caller, never crashes the supervisor.
//! - [`ProcError`] — managing one OS process failed (spawn, signal, wait).
//!   Contained to that process's handle and surfaced as events.
//!
//! Each type provides `as_label()` for stable snake_case identifiers in
//! logs and metrics.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Validation failures detected when loading process specifications.
///
/// Any of these aborts startup entirely: a supervisor never runs with a
/// spec set it could not validate.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpecError {
    /// Two specifications share the same `name`.
    #[error("duplicate process name '{name}'")]
    DuplicateName {
        /// The offending name.
        name: String,
    },

    /// `instances` was zero.
    #[error("process '{name}': instances must be at least 1")]
    NoInstances {
        /// Name of the offending spec.
        name: String,
    },

    /// The process name was empty.
    #[error("process name must not be empty")]
    EmptyName,

    /// The command was empty.
    #[error("process '{name}': command must not be empty")]
    EmptyCommand {
        /// Name of the offending spec.
        name: String,
    },
}

impl SpecError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SpecError::DuplicateName { .. } => "spec_duplicate_name",
            SpecError::NoInstances { .. } => "spec_no_instances",
            SpecError::EmptyName => "spec_empty_name",
            SpecError::EmptyCommand { .. } => "spec_empty_command",
        }
    }
}

/// Errors produced by the supervision runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A command referenced a process name that is not loaded.
    #[error("unknown process '{name}'")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// Shutdown grace period elapsed with processes still alive.
    #[error("shutdown grace {grace:?} exceeded; still alive: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of processes that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotFound { .. } => "runtime_not_found",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Errors produced while managing one OS process.
///
/// These never escape the owning actor: they are recorded on the handle
/// (state `Errored`) and published as events.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcError {
    /// The OS refused to create the process (binary missing, permission
    /// denied, bad working directory).
    #[error("failed to spawn '{name}': {source}")]
    Spawn {
        /// Process name from the spec.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A termination signal could not be delivered.
    ///
    /// Delivery to an already-dead pid is *not* reported as this variant;
    /// that case is treated as already-stopped.
    #[error("failed to signal pid {pid}: {source}")]
    Signal {
        /// Target OS process id.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Waiting on the child failed at the OS level.
    #[error("failed to wait on '{name}': {source}")]
    Wait {
        /// Process name from the spec.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl ProcError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcError::Spawn { .. } => "proc_spawn",
            ProcError::Signal { .. } => "proc_signal",
            ProcError::Wait { .. } => "proc_wait",
        }
    }
}
