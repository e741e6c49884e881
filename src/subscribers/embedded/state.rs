//! StateTracker — observer-side map of instance states.
//!
//! Maintains the last seen [`ProcessState`] per (process, instance) by
//! following lifecycle events. Useful for UIs and health endpoints that
//! want a cheap, copy-out view without asking the supervisor.
//!
//! The authoritative state always lives with the actors; this tracker is
//! eventually consistent with them (it lags by queue depth at most).

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::proc::ProcessState;
use crate::subscribers::Subscribe;

/// Tracks the last observed state of every instance.
pub struct StateTracker {
    inner: RwLock<BTreeMap<(String, u32), ProcessState>>,
    capacity: usize,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            capacity: 2048,
        }
    }

    /// Configures this subscriber's queue capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Sorted copy of the current (process, instance) → state map.
    #[must_use]
    pub fn snapshot(&self) -> Vec<((String, u32), ProcessState)> {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        guard.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Names of processes with at least one alive instance.
    #[must_use]
    pub fn alive(&self) -> Vec<String> {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        let mut names: Vec<String> = guard
            .iter()
            .filter(|(_, state)| state.is_alive())
            .map(|((name, _), _)| name.clone())
            .collect();
        names.dedup();
        names
    }

    fn apply(&self, event: &Event) {
        let state = match event.kind {
            EventKind::ProcessStarting => ProcessState::Starting,
            EventKind::ProcessReady => ProcessState::Running,
            EventKind::ProcessStopping => ProcessState::Stopping,
            EventKind::ProcessStopped => ProcessState::Stopped,
            EventKind::ProcessCrashed => ProcessState::Crashed,
            EventKind::SpawnFailed | EventKind::RestartsExhausted => ProcessState::Errored,
            EventKind::ProcessRemoved => {
                if let Some(name) = event.proc.as_deref() {
                    let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
                    guard.retain(|(n, _), _| n != name);
                }
                return;
            }
            _ => return,
        };

        let (Some(name), Some(instance)) = (event.proc.as_deref(), event.instance) else {
            return;
        };
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        guard.insert((name.to_string(), instance), state);
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for StateTracker {
    async fn on_event(&self, event: &Event) {
        self.apply(event);
    }

    fn name(&self) -> &'static str {
        "StateTracker"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}
