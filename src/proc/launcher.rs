//! Spawning OS processes from specifications.
//!
//! [`launch`] turns a [`ProcessSpec`] + instance index into a running
//! child: command line, working directory, and environment applied;
//! stdout/stderr piped into log pump tasks; the readiness observer wired
//! when the spec asks for one. The returned [`Spawned`] is handed to the
//! actor, which owns the child from then on.
//!
//! A spawn refusal (binary missing, permission denied) surfaces as
//! [`ProcError::Spawn`]; the actor marks the handle ERRORED and applies
//! restart policy — the launcher itself never retries.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio::sync::Notify;

use crate::error::ProcError;
use crate::proc::logs::{self, ReadyWatch};
use crate::spec::{ExecMode, ProcessSpec, ReadyPolicy};

/// Environment variable carrying the instance index in Cluster mode.
pub const INSTANCE_ENV: &str = "PROCVISOR_INSTANCE";

/// A freshly spawned child with its plumbing attached.
pub(crate) struct Spawned {
    /// The OS child; the actor owns and reaps it.
    pub child: Child,
    /// Pid captured right after spawn.
    pub pid: u32,
    /// Readiness notifier, present for [`ReadyPolicy::LineMatch`].
    pub ready: Option<Arc<Notify>>,
}

/// Spawns one instance of `spec`.
pub(crate) async fn launch(spec: &ProcessSpec, instance: u32) -> Result<Spawned, ProcError> {
    let mut cmd = Command::new(spec.command());
    cmd.args(spec.args());
    cmd.envs(spec.env());
    if let Some(dir) = spec.cwd() {
        cmd.current_dir(dir);
    }
    if spec.exec_mode() == ExecMode::Cluster {
        cmd.env(INSTANCE_ENV, instance.to_string());
    }

    // Pipes are only paid for when something consumes them.
    let wants_stdout =
        spec.logs().is_some() || matches!(spec.ready(), ReadyPolicy::LineMatch(_));
    let wants_stderr = spec.logs().is_some();

    cmd.stdin(Stdio::null());
    cmd.stdout(if wants_stdout {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stderr(if wants_stderr {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    // Safety net: a dropped supervisor must not leak children.
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| ProcError::Spawn {
        name: spec.name().to_string(),
        source: e,
    })?;
    let pid = child.id().unwrap_or_default();

    let (watch, ready) = match spec.ready() {
        ReadyPolicy::LineMatch(needle) => {
            let (watch, notify) = ReadyWatch::new(needle.clone());
            (Some(watch), Some(notify))
        }
        ReadyPolicy::Immediate => (None, None),
    };

    let (stdout_sink, stderr_sink) = logs::open_sinks(spec.logs()).await;
    if let Some(stdout) = child.stdout.take() {
        logs::spawn_pump(stdout, stdout_sink, watch);
    }
    if let Some(stderr) = child.stderr.take() {
        logs::spawn_pump(stderr, stderr_sink, None);
    }

    Ok(Spawned { child, pid, ready })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::spec::LogPaths;

    #[tokio::test]
    async fn launch_captures_a_pid() {
        let spec = ProcessSpec::builder("t", "/bin/sh")
            .args(["-c", "exit 0"])
            .build();
        let mut spawned = launch(&spec, 0).await.expect("spawn");
        assert!(spawned.pid > 0);
        let status = spawned.child.wait().await.expect("wait");
        assert!(status.success());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let spec = ProcessSpec::builder("t", "/no/such/binary-procvisor").build();
        let err = launch(&spec, 0).await.err().expect("spawn must fail");
        assert_eq!(err.as_label(), "proc_spawn");
    }

    #[tokio::test]
    async fn cluster_mode_exposes_instance_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.log");
        let spec = ProcessSpec::builder("t", "/bin/sh")
            .args(["-c", "echo index=$PROCVISOR_INSTANCE"])
            .exec_mode(ExecMode::Cluster)
            .logs(LogPaths::new(&out, dir.path().join("err.log")))
            .build();

        let mut spawned = launch(&spec, 3).await.expect("spawn");
        spawned.child.wait().await.expect("wait");

        // The pump runs concurrently; give it a moment to drain EOF.
        for _ in 0..100 {
            let content = tokio::fs::read_to_string(&out).await.unwrap_or_default();
            if content.contains("index=3") {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("instance index never appeared in the log");
    }
}
