//! Builder wiring the supervisor's runtime components together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::core::registry::Registry;
use crate::core::supervisor::Supervisor;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for [`Supervisor`].
///
/// Must be consumed inside a Tokio runtime: `build()` spawns the
/// subscriber worker tasks.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a builder with the given configuration and no subscribers.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue; slow
    /// subscribers never block the supervisor.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor and its runtime plumbing.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let root = CancellationToken::new();
        let registry = Registry::new(bus.clone(), root.clone(), self.cfg.sample_interval);

        Arc::new(Supervisor::new_internal(
            self.cfg, bus, subs, registry, root,
        ))
    }
}
