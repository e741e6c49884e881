//! Runtime core: orchestration and lifecycle.
//!
//! Internal modules:
//! - [`actor`]: supervises one (spec, instance) pair with restart policy,
//!   backoff, readiness, and memory-ceiling enforcement;
//! - [`registry`]: owns the per-process instance slots;
//! - [`supervisor`]: command surface and graceful shutdown;
//! - [`shutdown`]: OS signal handling for the supervisor itself.

mod actor;
mod builder;
mod registry;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use supervisor::Supervisor;
