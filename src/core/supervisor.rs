//! Supervisor: the control core owning every process handle.
//!
//! The [`Supervisor`] owns the event bus, the subscriber fan-out, and the
//! [`Registry`] of process actors. It loads a validated [`SpecStore`],
//! spawns one actor per (spec, instance), exposes the command surface
//! (`start` / `stop` / `restart` / `delete` / `status`), and performs
//! graceful shutdown on an OS signal or an explicit [`Supervisor::shutdown`].
//!
//! ## High-level flow
//! ```text
//! SpecStore ──► Supervisor::run(store)
//!    │             ├─ subscriber_listener(): Bus ─► SubscriberSet::emit   (fan-out)
//!    │             ├─ Registry::add(spec)   (one actor per instance)
//!    │             └─ select! {
//!    │                   OS signal / shutdown() ─► root token cancel
//!    │                   all actors finished    ─► Ok(())
//!    │                }
//!    │                   └─► wait ≤ grace ─► AllStoppedWithin | GraceExceeded
//!    │
//! Commands (any task):  start/stop/restart/delete/status ─► Registry
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use procvisor::{
//!     LogPaths, ProcessSpec, RestartPolicy, SpecStore, Supervisor, SupervisorConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SpecStore::load(vec![ProcessSpec::builder("web", "yarn")
//!         .args(["workspace", "@acme/web", "start"])
//!         .restart(RestartPolicy::Always)
//!         .logs(LogPaths::new("logs/web-out.log", "logs/web-error.log")
//!             .combined("logs/web-combined.log")
//!             .timestamps())
//!         .build()])?;
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default()).build();
//!     sup.run(store).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SupervisorConfig;
use crate::core::builder::SupervisorBuilder;
use crate::core::registry::Registry;
use crate::core::shutdown;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::proc::ProcessStatus;
use crate::spec::SpecStore;
use crate::subscribers::SubscriberSet;

/// Coordinates process actors, event delivery, and graceful shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Arc<Registry>,
    store: RwLock<SpecStore>,
    root: CancellationToken,
}

impl Supervisor {
    /// Creates a builder for constructing a supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        registry: Arc<Registry>,
        root: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            registry,
            store: RwLock::new(SpecStore::default()),
            root,
        }
    }

    /// Creates a receiver observing every runtime event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Supervises the loaded specs until either every actor exits on its
    /// own or a termination signal arrives (then: graceful shutdown, which
    /// may end with [`RuntimeError::GraceExceeded`]).
    pub async fn run(&self, store: SpecStore) -> Result<(), RuntimeError> {
        self.subscriber_listener();

        let specs: Vec<_> = store.iter().collect();
        *self.store.write().await = store;
        for spec in specs {
            self.registry.add(spec).await;
        }
        self.registry.close();

        self.drive_shutdown().await
    }

    /// Requests supervisor shutdown programmatically (same path as an OS
    /// signal).
    pub fn shutdown(&self) {
        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.root.cancel();
    }

    /// Respawns all stopped instances of `name`.
    ///
    /// Instances that are already alive are left alone, so a `stop`
    /// followed by `start` can never produce two RUNNING handles for one
    /// (spec, instance) pair.
    pub async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        let spec = self
            .store
            .read()
            .await
            .get(name)
            .ok_or_else(|| RuntimeError::NotFound {
                name: name.to_string(),
            })?;
        // Covers both "registered but stopped" and "never registered".
        self.registry.add(spec).await;
        self.registry.start(name).await
    }

    /// Stops all instances of `name` gracefully; returns once the OS
    /// processes are gone.
    pub async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.ensure_known(name).await?;
        self.registry.stop(name).await
    }

    /// Sequential stop-then-start. A brief gap with no process alive is
    /// accepted.
    pub async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.stop(name).await?;
        self.start(name).await
    }

    /// Stops `name` and removes both its handles and its spec.
    pub async fn delete(&self, name: &str) -> Result<(), RuntimeError> {
        let removed = self.store.write().await.remove(name);
        if removed.is_none() {
            return Err(RuntimeError::NotFound {
                name: name.to_string(),
            });
        }
        self.registry.delete(name).await
    }

    /// Snapshot of every instance's status, ordered by (name, instance).
    pub async fn status(&self) -> Vec<ProcessStatus> {
        self.registry.statuses().await
    }

    async fn ensure_known(&self, name: &str) -> Result<(), RuntimeError> {
        if self.store.read().await.get(name).is_none() {
            return Err(RuntimeError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Waits for a reason to stop, then winds the actors down.
    async fn drive_shutdown(&self) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = shutdown::wait_for_signal() => {
                self.bus.publish(Event::now(EventKind::ShutdownRequested));
                self.root.cancel();
            }
            _ = self.root.cancelled() => {
                // shutdown() already published the event.
            }
            _ = self.registry.wait_idle() => {
                info!("all actors finished on their own");
                return Ok(());
            }
        }
        self.wait_with_grace().await
    }

    /// Bounded wait for every actor to finish after cancellation.
    async fn wait_with_grace(&self) -> Result<(), RuntimeError> {
        match time::timeout(self.cfg.grace, self.registry.wait_idle()).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                let stuck = self.registry.alive_names().await;
                Err(RuntimeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }
}
