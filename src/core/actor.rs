//! ProcessActor: supervisor for a single (spec, instance) pair.
//!
//! One actor owns one instance slot for the duration of a run. It is the
//! **only** writer of that slot's [`ProcessStatus`]; every state
//! transition goes through the actor's own loop, so transitions are never
//! applied concurrently for the same handle.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► state STARTING, publish ProcessStarting
//!   ├─► launch() ── Err ─► state ERRORED, publish SpawnFailed ─► policy/budget
//!   ├─► readiness: line match | window elapsed | immediate ─► RUNNING
//!   ├─► supervise: select! {
//!   │       child exit      ─► CRASHED (or STOPPED when stop requested)
//!   │       stop requested  ─► STOPPING ─► SIGTERM ─► kill_timeout ─► SIGKILL
//!   │       sampling tick   ─► rss > max_memory ─► MemoryExceeded ─► crash path
//!   │   }
//!   └─► on crash: restarts += 1
//!         ├─► policy forbids        ─► exit loop (state CRASHED)
//!         ├─► budget spent          ─► state ERRORED, RestartsExhausted
//!         └─► BackoffScheduled ─► cancellable sleep ─► next attempt
//! }
//! ```
//!
//! ## Rules
//! - A requested stop always wins over restart policy.
//! - The restart counter is monotonic for one actor run and never resets.
//! - Cancellation is honored at every wait point (readiness, run, backoff).

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::process::Child;
use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ProcError;
use crate::events::{Bus, Event, EventKind};
use crate::proc::launcher::{self, Spawned};
use crate::proc::memory::MemorySampler;
use crate::proc::signal;
use crate::proc::{ProcessState, ProcessStatus};
use crate::spec::ProcessSpec;

/// How one spawned child came to an end.
enum Exit {
    /// A stop was requested; do not restart.
    Requested { code: Option<i32> },
    /// The child went away on its own (exit, wait failure, memory kill).
    Unrequested {
        code: Option<i32>,
        clean: bool,
        reason: &'static str,
    },
}

/// Why the RUNNING phase ended.
enum Cause {
    Exited(std::io::Result<std::process::ExitStatus>),
    StopRequested,
    MemoryKill(u64),
}

/// How the STARTING phase resolved.
enum StartCause {
    Ready(&'static str),
    Exited(std::io::Result<std::process::ExitStatus>),
    StopRequested,
}

/// Supervises one instance of one process specification.
pub(crate) struct ProcessActor {
    spec: Arc<ProcessSpec>,
    instance: u32,
    bus: Bus,
    status: watch::Sender<ProcessStatus>,
    sample_interval: Duration,
    sampler: Option<MemorySampler>,
}

impl ProcessActor {
    pub(crate) fn new(
        spec: Arc<ProcessSpec>,
        instance: u32,
        bus: Bus,
        status: watch::Sender<ProcessStatus>,
        sample_interval: Duration,
    ) -> Self {
        Self {
            spec,
            instance,
            bus,
            status,
            sample_interval,
            sampler: None,
        }
    }

    /// Runs the actor until the child stops on request, the restart policy
    /// or budget forbids another attempt, or the token is cancelled.
    pub(crate) async fn run(mut self, stop: CancellationToken) {
        let mut restarts: u32 = 0;

        loop {
            if stop.is_cancelled() {
                self.set(ProcessState::Stopped, |_| {});
                break;
            }

            self.set(ProcessState::Starting, |s| {
                s.pid = None;
                s.restarts = restarts;
            });
            self.publish(Event::now(EventKind::ProcessStarting).with_attempt(restarts + 1));

            let spawned = match launcher::launch(&self.spec, self.instance).await {
                Ok(spawned) => spawned,
                Err(e) => {
                    self.set(ProcessState::Errored, |_| {});
                    self.publish(Event::now(EventKind::SpawnFailed).with_reason(e.to_string()));
                    // A refused spawn is a failed attempt for policy purposes.
                    if !self.spec.restart().should_restart(false) {
                        break;
                    }
                    restarts += 1;
                    if !self.backoff_or_stop(&stop, restarts, "spawn failed").await {
                        break;
                    }
                    continue;
                }
            };

            self.set(ProcessState::Starting, |s| {
                s.pid = Some(spawned.pid);
                s.started_at = Some(SystemTime::now());
            });

            match self.supervise(spawned, &stop).await {
                Exit::Requested { code } => {
                    self.set(ProcessState::Stopped, |s| {
                        s.pid = None;
                        s.last_exit = code;
                    });
                    let mut ev = Event::now(EventKind::ProcessStopped);
                    if let Some(code) = code {
                        ev = ev.with_exit_code(code);
                    }
                    self.publish(ev);
                    break;
                }
                Exit::Unrequested {
                    code,
                    clean,
                    reason,
                } => {
                    restarts += 1;
                    self.set(ProcessState::Crashed, |s| {
                        s.pid = None;
                        s.last_exit = code;
                        s.restarts = restarts;
                    });
                    let mut ev = Event::now(EventKind::ProcessCrashed)
                        .with_attempt(restarts)
                        .with_reason(reason);
                    if let Some(code) = code {
                        ev = ev.with_exit_code(code);
                    }
                    self.publish(ev);

                    if !self.spec.restart().should_restart(clean) {
                        break;
                    }
                    if !self.backoff_or_stop(&stop, restarts, reason).await {
                        break;
                    }
                }
            }
        }
    }

    /// Drives one spawned child from STARTING to its end.
    async fn supervise(&mut self, spawned: Spawned, stop: &CancellationToken) -> Exit {
        let Spawned {
            mut child,
            pid,
            ready,
        } = spawned;

        // STARTING → RUNNING.
        if let Some(ready) = ready {
            let cause = tokio::select! {
                _ = ready.notified() => StartCause::Ready("ready signal observed"),
                _ = time::sleep(self.spec.ready_timeout()) => {
                    StartCause::Ready("readiness window elapsed")
                }
                res = child.wait() => StartCause::Exited(res),
                _ = stop.cancelled() => StartCause::StopRequested,
            };
            match cause {
                StartCause::Ready(reason) => self.enter_running(pid, reason),
                StartCause::Exited(res) => {
                    return self.classify_exit(res, "exited while starting");
                }
                StartCause::StopRequested => {
                    return self.stop_child(&mut child, pid).await;
                }
            }
        } else {
            self.enter_running(pid, "spawned");
        }

        // RUNNING until exit, stop, or memory kill.
        let mut tick = time::interval_at(
            time::Instant::now() + self.sample_interval,
            self.sample_interval,
        );
        let cause = loop {
            tokio::select! {
                res = child.wait() => break Cause::Exited(res),
                _ = stop.cancelled() => break Cause::StopRequested,
                _ = tick.tick() => {
                    if let Some(rss) = self.over_memory_ceiling(pid) {
                        break Cause::MemoryKill(rss);
                    }
                }
            }
        };

        match cause {
            Cause::Exited(res) => self.classify_exit(res, "exited"),
            Cause::StopRequested => self.stop_child(&mut child, pid).await,
            Cause::MemoryKill(rss) => {
                self.publish(
                    Event::now(EventKind::MemoryExceeded)
                        .with_pid(pid)
                        .with_rss(rss),
                );
                let code = self.terminate_and_reap(&mut child, pid).await;
                Exit::Unrequested {
                    code,
                    clean: false,
                    reason: "memory ceiling exceeded",
                }
            }
        }
    }

    /// Graceful stop sequence for a requested stop.
    async fn stop_child(&self, child: &mut Child, pid: u32) -> Exit {
        self.set(ProcessState::Stopping, |_| {});
        self.publish(Event::now(EventKind::ProcessStopping).with_pid(pid));
        let code = self.terminate_and_reap(child, pid).await;
        Exit::Requested { code }
    }

    /// SIGTERM, wait up to `kill_timeout`, then SIGKILL. Returns the exit
    /// code when the child reported one.
    async fn terminate_and_reap(&self, child: &mut Child, pid: u32) -> Option<i32> {
        if let Err(e) = signal::terminate(pid) {
            warn!(proc = self.spec.name(), error = %e, "termination signal failed");
        }
        match time::timeout(self.spec.kill_timeout(), child.wait()).await {
            Ok(Ok(status)) => status.code(),
            Ok(Err(e)) => {
                let err = ProcError::Wait {
                    name: self.spec.name().to_string(),
                    source: e,
                };
                warn!(error = %err, "reaping after terminate failed");
                None
            }
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    warn!(proc = self.spec.name(), error = %e, "forceful kill failed");
                }
                None
            }
        }
    }

    /// Classifies an unrequested wait() result.
    fn classify_exit(
        &self,
        res: std::io::Result<std::process::ExitStatus>,
        reason: &'static str,
    ) -> Exit {
        match res {
            Ok(status) => Exit::Unrequested {
                code: status.code(),
                clean: status.success(),
                reason,
            },
            Err(e) => {
                let err = ProcError::Wait {
                    name: self.spec.name().to_string(),
                    source: e,
                };
                warn!(error = %err, "wait failed");
                Exit::Unrequested {
                    code: None,
                    clean: false,
                    reason: "wait failed",
                }
            }
        }
    }

    /// Returns `Some(rss)` when the child currently exceeds its ceiling.
    fn over_memory_ceiling(&mut self, pid: u32) -> Option<u64> {
        let limit = self.spec.max_memory()?;
        let sampler = self.sampler.get_or_insert_with(MemorySampler::new);
        let rss = sampler.rss_bytes(pid)?;
        (rss > limit).then_some(rss)
    }

    /// Decides whether another attempt happens; sleeps through backoff.
    ///
    /// Returns `false` when the loop must exit: restart budget spent (state
    /// ERRORED, `RestartsExhausted` published) or stop requested during the
    /// backoff sleep (state STOPPED).
    async fn backoff_or_stop(
        &self,
        stop: &CancellationToken,
        restarts: u32,
        reason: &'static str,
    ) -> bool {
        if let Some(budget) = self.spec.max_restarts() {
            if restarts > budget {
                self.set(ProcessState::Errored, |_| {});
                self.publish(
                    Event::now(EventKind::RestartsExhausted)
                        .with_attempt(restarts)
                        .with_reason(reason),
                );
                return false;
            }
        }

        let delay = self.spec.backoff().delay_for(restarts - 1);
        self.publish(
            Event::now(EventKind::BackoffScheduled)
                .with_attempt(restarts)
                .with_delay(delay)
                .with_reason(reason),
        );

        tokio::select! {
            _ = time::sleep(delay) => true,
            _ = stop.cancelled() => {
                self.set(ProcessState::Stopped, |_| {});
                false
            }
        }
    }

    fn enter_running(&self, pid: u32, reason: &'static str) {
        self.set(ProcessState::Running, |_| {});
        self.publish(
            Event::now(EventKind::ProcessReady)
                .with_pid(pid)
                .with_reason(reason),
        );
    }

    /// Applies a state transition to the handle (single writer).
    fn set(&self, state: ProcessState, f: impl FnOnce(&mut ProcessStatus)) {
        self.status.send_modify(|s| {
            s.state = state;
            f(s);
        });
    }

    /// Publishes an event stamped with this actor's identity.
    fn publish(&self, ev: Event) {
        self.bus
            .publish(ev.with_proc(self.spec.name()).with_instance(self.instance));
    }
}
