//! End-to-end supervision tests against real OS processes.
//!
//! Every test drives `/bin/sh` children through the public API and
//! observes handle snapshots and bus events. Generous polling windows
//! keep them robust on loaded CI machines.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use procvisor::{
    BackoffPolicy, Event, EventKind, ExecMode, JitterPolicy, LogPaths, ProcessSpec, ProcessState,
    ProcessStatus, ReadyPolicy, RestartPolicy, RuntimeError, SpecStore, Supervisor,
    SupervisorConfig,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

fn test_config() -> SupervisorConfig {
    let mut cfg = SupervisorConfig::default();
    cfg.grace = Duration::from_secs(10);
    cfg.sample_interval = Duration::from_millis(100);
    cfg
}

fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        first: Duration::from_millis(25),
        max: Duration::from_millis(100),
        factor: 1.0,
        jitter: JitterPolicy::None,
    }
}

fn sh(name: &str, script: &str) -> procvisor::ProcessSpecBuilder {
    ProcessSpec::builder(name, "/bin/sh")
        .args(["-c", script])
        .backoff(fast_backoff())
}

fn spawn_run(
    sup: &Arc<Supervisor>,
    store: SpecStore,
) -> JoinHandle<Result<(), RuntimeError>> {
    let sup = Arc::clone(sup);
    tokio::spawn(async move { sup.run(store).await })
}

/// Polls the status snapshot until `pred` holds or the window elapses.
async fn wait_for(
    sup: &Supervisor,
    window: Duration,
    pred: impl Fn(&[ProcessStatus]) -> bool,
) -> Vec<ProcessStatus> {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        let statuses = sup.status().await;
        if pred(&statuses) {
            return statuses;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached within {window:?}; last statuses: {statuses:?}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Waits for the next event of the given kind.
async fn wait_event(
    rx: &mut broadcast::Receiver<Event>,
    kind: EventKind,
    window: Duration,
) -> Event {
    tokio::time::timeout(window, async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {kind:?} event within {window:?}"))
}

#[tokio::test]
async fn start_reaches_running() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "sleep 30").build()]).expect("load");
    let run = spawn_run(&sup, store);

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].pid.is_some());
    assert_eq!(statuses[0].restarts, 0);

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn cluster_mode_runs_every_instance() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("api", "sleep 30")
        .instances(2)
        .exec_mode(ExecMode::Cluster)
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.len() == 2 && s.iter().all(|p| p.state == ProcessState::Running)
    })
    .await;
    let instances: Vec<u32> = statuses.iter().map(|p| p.instance).collect();
    assert_eq!(instances, [0, 1]);

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn killed_process_is_restarted_with_counter() {
    let sup = Supervisor::builder(test_config()).build();
    let mut events = sup.subscribe();
    let store = SpecStore::load(vec![sh("web", "sleep 30")
        .restart(RestartPolicy::Always)
        .max_restarts(Some(5))
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;
    let pid = statuses[0].pid.expect("running pid");

    // Kill it out from under the supervisor.
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    )
    .expect("kill");

    let crashed = wait_event(&mut events, EventKind::ProcessCrashed, Duration::from_secs(5)).await;
    assert_eq!(crashed.proc.as_deref(), Some("web"));

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter()
            .any(|p| p.state == ProcessState::Running && p.restarts == 1)
    })
    .await;
    assert_ne!(statuses[0].pid, Some(pid), "restart must spawn a new pid");

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn restart_budget_is_enforced() {
    let sup = Supervisor::builder(test_config()).build();
    let mut events = sup.subscribe();
    let store = SpecStore::load(vec![sh("flaky", "exit 1")
        .restart(RestartPolicy::OnFailure)
        .max_restarts(Some(3))
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    wait_event(
        &mut events,
        EventKind::RestartsExhausted,
        Duration::from_secs(10),
    )
    .await;

    // 1 initial attempt + 3 restarts, never a 4th restart.
    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Errored)
    })
    .await;
    assert_eq!(statuses[0].restarts, 4);

    // The actor is done; nothing changes afterwards.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = sup.status().await;
    assert_eq!(after[0].restarts, 4);
    assert_eq!(after[0].state, ProcessState::Errored);

    // With its only actor exhausted, run() drains on its own.
    run.await.expect("join").expect("idle exit");
}

#[tokio::test]
async fn stop_then_start_never_doubles_a_handle() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "sleep 30")
        .restart(RestartPolicy::Always)
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;

    // A requested stop wins over RestartPolicy::Always.
    sup.stop("web").await.expect("stop");
    let statuses = sup.status().await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, ProcessState::Stopped);
    assert_eq!(statuses[0].restarts, 0);

    // And it stays stopped.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sup.status().await[0].state, ProcessState::Stopped);

    sup.start("web").await.expect("start");
    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;
    // Still exactly one handle for (web, 0).
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].instance, 0);

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn log_files_grow_across_restarts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("echo-out.log");

    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("echoer", "echo line")
        .restart(RestartPolicy::Always)
        .max_restarts(Some(2))
        .logs(LogPaths::new(&out, dir.path().join("echo-err.log")))
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    // 1 initial run + 2 restarts = 3 lines appended, nothing truncated.
    run.await.expect("join").expect("idle exit");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let content = tokio::fs::read_to_string(&out).await.unwrap_or_default();
        if content == "line\nline\nline\n" {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("unexpected log content: {content:?}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn delete_kills_the_os_process_and_forgets_the_spec() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "sleep 30").build()]).expect("load");
    let run = spawn_run(&sup, store);

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;
    let pid = statuses[0].pid.expect("running pid");

    sup.delete("web").await.expect("delete");

    // The OS process is gone (actor reaped it before delete returned).
    let probe = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None);
    assert_eq!(probe, Err(nix::errno::Errno::ESRCH));

    // And so is the spec.
    assert!(sup.status().await.is_empty());
    let err = sup.start("web").await.expect_err("deleted spec");
    assert!(matches!(err, RuntimeError::NotFound { .. }));

    run.await.expect("join").expect("idle exit");
}

#[tokio::test]
async fn memory_ceiling_triggers_restart() {
    let sup = Supervisor::builder(test_config()).build();
    let mut events = sup.subscribe();
    // Any real process exceeds a one-byte ceiling on the first sample.
    let store = SpecStore::load(vec![sh("hog", "sleep 30")
        .restart(RestartPolicy::Always)
        .max_restarts(Some(32))
        .max_memory(Some(1))
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    let exceeded =
        wait_event(&mut events, EventKind::MemoryExceeded, Duration::from_secs(5)).await;
    assert_eq!(exceeded.proc.as_deref(), Some("hog"));
    assert!(exceeded.rss_bytes.unwrap_or(0) > 1);

    wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.restarts >= 1)
    })
    .await;

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn line_match_readiness_beats_the_window() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "echo booting; echo now serving; sleep 30")
        .ready(ReadyPolicy::LineMatch("now serving".into()))
        .ready_timeout(Duration::from_secs(30))
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    // RUNNING long before the 30s readiness window could elapse.
    wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn spawn_failure_marks_the_handle_errored() {
    let sup = Supervisor::builder(test_config()).build();
    let mut events = sup.subscribe();
    let store = SpecStore::load(vec![ProcessSpec::builder("ghost", "/no/such/bin-procvisor")
        .restart(RestartPolicy::Never)
        .build()])
    .expect("load");
    let run = spawn_run(&sup, store);

    wait_event(&mut events, EventKind::SpawnFailed, Duration::from_secs(5)).await;
    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Errored)
    })
    .await;
    assert!(statuses[0].pid.is_none());

    run.await.expect("join").expect("idle exit");
}

#[tokio::test]
async fn unknown_names_are_reported_not_fatal() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "sleep 30").build()]).expect("load");
    let run = spawn_run(&sup, store);

    wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;

    for result in [
        sup.stop("ghost").await,
        sup.start("ghost").await,
        sup.delete("ghost").await,
    ] {
        let err = result.expect_err("unknown name");
        assert_eq!(err.as_label(), "runtime_not_found");
    }

    // The loop is unaffected; "web" is still supervised.
    assert_eq!(sup.status().await.len(), 1);

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}

#[tokio::test]
async fn restart_command_replaces_the_process() {
    let sup = Supervisor::builder(test_config()).build();
    let store = SpecStore::load(vec![sh("web", "sleep 30").build()]).expect("load");
    let run = spawn_run(&sup, store);

    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter().any(|p| p.state == ProcessState::Running)
    })
    .await;
    let old_pid = statuses[0].pid.expect("running pid");

    sup.restart("web").await.expect("restart");
    let statuses = wait_for(&sup, Duration::from_secs(5), |s| {
        s.iter()
            .any(|p| p.state == ProcessState::Running && p.pid != Some(old_pid))
    })
    .await;
    assert_eq!(statuses.len(), 1);

    sup.shutdown();
    run.await.expect("join").expect("graceful shutdown");
}
