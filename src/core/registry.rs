//! Registry of supervised processes and their instance slots.
//!
//! The registry owns, per process name, one slot per instance: the actor's
//! join handle, its stop token, and the watch receiver for its status.
//! All structural mutation (adding, respawning, removing slots) is
//! serialized behind one `RwLock`, while the status *values* inside the
//! slots are only ever written by their actors.
//!
//! ## Rules
//! - At most one live actor per (name, instance): `start` only replaces
//!   slots whose actor has finished.
//! - `stop` cancels and then joins, so when it returns the OS processes
//!   are gone.
//! - Every actor is spawned through a [`TaskTracker`], which gives the
//!   supervisor a single place to wait for "everything has stopped"
//!   during shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::core::actor::ProcessActor;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::proc::ProcessStatus;
use crate::spec::ProcessSpec;

/// One instance slot: the actor plus the read side of its handle.
///
/// `join` is `None` once the actor has been joined (a stopped slot that
/// has not been respawned yet).
struct Slot {
    status: watch::Receiver<ProcessStatus>,
    stop: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl Slot {
    fn actor_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

struct Entry {
    spec: Arc<ProcessSpec>,
    slots: Vec<Slot>,
}

/// Keeps every supervised process's slots; structural single-writer.
pub(crate) struct Registry {
    procs: RwLock<HashMap<String, Entry>>,
    bus: Bus,
    root: CancellationToken,
    tracker: TaskTracker,
    sample_interval: Duration,
}

impl Registry {
    pub(crate) fn new(
        bus: Bus,
        root: CancellationToken,
        sample_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            procs: RwLock::new(HashMap::new()),
            bus,
            root,
            tracker: TaskTracker::new(),
            sample_interval,
        })
    }

    /// Places a spec under supervision and spawns all its instances.
    ///
    /// Idempotent: a name that is already registered is left untouched.
    pub(crate) async fn add(&self, spec: Arc<ProcessSpec>) {
        let mut procs = self.procs.write().await;
        if procs.contains_key(spec.name()) {
            return;
        }
        let slots = (0..spec.instances())
            .map(|i| self.spawn_slot(&spec, i))
            .collect();
        let name = spec.name().to_string();
        procs.insert(name.clone(), Entry { spec, slots });
        drop(procs);

        debug!(proc = %name, "process added");
        self.bus
            .publish(Event::now(EventKind::ProcessAdded).with_proc(name));
    }

    /// Respawns every instance of `name` whose actor has finished.
    ///
    /// Slots with a live actor are skipped: there is never a second actor
    /// for a (name, instance) pair.
    pub(crate) async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        let mut procs = self.procs.write().await;
        let entry = procs.get_mut(name).ok_or_else(|| RuntimeError::NotFound {
            name: name.to_string(),
        })?;
        let spec = entry.spec.clone();
        for (i, slot) in entry.slots.iter_mut().enumerate() {
            if slot.actor_finished() {
                *slot = self.spawn_slot(&spec, i as u32);
            }
        }
        Ok(())
    }

    /// Stops every instance of `name` and waits until the actors are done.
    ///
    /// The write lock is held across the termination sequence, so no
    /// concurrent `start` can observe a half-stopped entry.
    pub(crate) async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        let mut procs = self.procs.write().await;
        let entry = procs.get_mut(name).ok_or_else(|| RuntimeError::NotFound {
            name: name.to_string(),
        })?;
        Self::stop_slots(&mut entry.slots).await;
        Ok(())
    }

    /// Stops `name` and removes it from the registry entirely.
    pub(crate) async fn delete(&self, name: &str) -> Result<(), RuntimeError> {
        let mut entry = {
            let mut procs = self.procs.write().await;
            procs.remove(name).ok_or_else(|| RuntimeError::NotFound {
                name: name.to_string(),
            })?
        };
        Self::stop_slots(&mut entry.slots).await;

        debug!(proc = %name, "process removed");
        self.bus
            .publish(Event::now(EventKind::ProcessRemoved).with_proc(name));
        Ok(())
    }

    /// Snapshot of every instance's status, ordered by (name, instance).
    pub(crate) async fn statuses(&self) -> Vec<ProcessStatus> {
        let procs = self.procs.read().await;
        let mut out: Vec<ProcessStatus> = procs
            .values()
            .flat_map(|e| e.slots.iter().map(|s| s.status.borrow().clone()))
            .collect();
        out.sort_by(|a, b| (a.name.as_str(), a.instance).cmp(&(b.name.as_str(), b.instance)));
        out
    }

    /// Names of processes that still have an alive instance.
    pub(crate) async fn alive_names(&self) -> Vec<String> {
        let procs = self.procs.read().await;
        let mut names: Vec<String> = procs
            .iter()
            .filter(|(_, e)| {
                e.slots
                    .iter()
                    .any(|s| s.status.borrow().state.is_alive())
            })
            .map(|(n, _)| n.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Marks the tracker closed; [`Registry::wait_idle`] then completes as
    /// soon as no actor is running.
    pub(crate) fn close(&self) {
        self.tracker.close();
    }

    /// Completes when the tracker is closed and every actor has finished.
    pub(crate) async fn wait_idle(&self) {
        self.tracker.wait().await;
    }

    async fn stop_slots(slots: &mut [Slot]) {
        for slot in slots.iter() {
            slot.stop.cancel();
        }
        for slot in slots.iter_mut() {
            if let Some(join) = slot.join.take() {
                if let Err(e) = join.await {
                    if e.is_panic() {
                        tracing::warn!(error = %e, "actor panicked");
                    }
                }
            }
        }
    }

    fn spawn_slot(&self, spec: &Arc<ProcessSpec>, instance: u32) -> Slot {
        let (tx, rx) = watch::channel(ProcessStatus::new(spec.name(), instance));
        let stop = self.root.child_token();
        let actor = ProcessActor::new(
            spec.clone(),
            instance,
            self.bus.clone(),
            tx,
            self.sample_interval,
        );
        let join = self.tracker.spawn(actor.run(stop.clone()));
        Slot {
            status: rx,
            stop,
            join: Some(join),
        }
    }
}
