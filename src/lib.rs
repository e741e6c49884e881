//! # procvisor
//!
//! **Procvisor** is a process supervision runtime for Rust.
//!
//! It starts named OS worker processes from declarative specifications,
//! restarts them on failure with configurable policies, enforces
//! resident-memory ceilings, routes their output to append-only log
//! files, and performs orderly shutdown. It is a library core: config
//! file parsing and CLI surfaces are the caller's business.
//!
//! ## Architecture
//! ```text
//!   ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!   │  ProcessSpec  │  │  ProcessSpec  │  │  ProcessSpec  │
//!   │    ("web")    │  │    ("api")    │  │   ("worker")  │
//!   └───────┬───────┘  └───────┬───────┘  └───────┬───────┘
//!           └──────────── SpecStore::load ────────┘   (validation)
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                   │
//! │  - Bus (broadcast events)                                     │
//! │  - SubscriberSet (fan-out to subscribers)                     │
//! │  - Registry (instance slots per process)                      │
//! │  - commands: start / stop / restart / delete / status         │
//! └──────┬───────────────────┬───────────────────┬────────────────┘
//!        ▼                   ▼                   ▼
//!   ┌───────────┐      ┌───────────┐      ┌───────────┐
//!   │ProcActor  │      │ProcActor  │      │ProcActor  │  (one per
//!   │ web #0    │      │ api #0    │      │ api #1    │   instance)
//!   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘
//!         │ spawn/wait       │                  │
//!         ▼                  ▼                  ▼
//!    OS process         OS process         OS process
//!         │                  │                  │
//!         └── stdout/stderr ─┴─► Log Router ────┴─► append-only files
//! ```
//!
//! Each actor exclusively owns its instance's handle: every state
//! transition (STOPPED, STARTING, RUNNING, STOPPING, CRASHED, ERRORED)
//! is applied on the actor's own loop and published as an [`Event`].
//! Observers get copies, never locks.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use procvisor::{
//!     EventLog, LogPaths, ProcessSpec, ReadyPolicy, RestartPolicy, SpecStore, Subscribe,
//!     Supervisor, SupervisorConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let specs = vec![
//!         ProcessSpec::builder("web", "yarn")
//!             .args(["workspace", "@acme/web", "start"])
//!             .env("NODE_ENV", "production")
//!             .env("PORT", "3000")
//!             .restart(RestartPolicy::Always)
//!             .max_memory(Some(2 * 1024 * 1024 * 1024))
//!             .kill_timeout(Duration::from_secs(5))
//!             .ready(ReadyPolicy::LineMatch("ready".into()))
//!             .ready_timeout(Duration::from_secs(10))
//!             .logs(
//!                 LogPaths::new("logs/web-out.log", "logs/web-error.log")
//!                     .combined("logs/web-combined.log")
//!                     .timestamps(),
//!             )
//!             .build(),
//!     ];
//!
//!     let store = SpecStore::load(specs)?;
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(EventLog::new())];
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Runs until SIGINT/SIGTERM, then stops every child gracefully.
//!     sup.run(store).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod policies;
mod proc;
mod spec;
mod subscribers;

// ---- Public re-exports ----

pub use config::SupervisorConfig;
pub use core::{Supervisor, SupervisorBuilder};
pub use error::{ProcError, RuntimeError, SpecError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
pub use proc::{ProcessState, ProcessStatus};
pub use spec::{ExecMode, LogPaths, ProcessSpec, ProcessSpecBuilder, ReadyPolicy, SpecStore};
pub use subscribers::{EventLog, StateTracker, Subscribe, SubscriberSet};
