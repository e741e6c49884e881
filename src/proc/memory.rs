//! Resident-memory sampling for supervised processes.
//!
//! The actor of a process with a `max_memory` ceiling samples its child's
//! resident set on a timer and treats an over-limit sample like a crash.
//! Sampling is read-only and best-effort: a pid that cannot be refreshed
//! (already exited, permissions) simply yields no sample.

use sysinfo::{PidExt, ProcessExt, ProcessRefreshKind, RefreshKind, System, SystemExt};

/// Lazily refreshed view over OS process statistics.
///
/// One sampler per actor; it only ever refreshes its own child's entry.
pub(crate) struct MemorySampler {
    system: System,
}

impl MemorySampler {
    pub(crate) fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::new().with_processes(ProcessRefreshKind::new()),
            ),
        }
    }

    /// Returns the resident set size of `pid` in bytes, or `None` when the
    /// process cannot be observed.
    pub(crate) fn rss_bytes(&mut self, pid: u32) -> Option<u64> {
        let pid = sysinfo::Pid::from_u32(pid);
        if !self.system.refresh_process(pid) {
            return None;
        }
        self.system.process(pid).map(|p| p.memory())
    }
}
