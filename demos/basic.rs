//! # Demo: basic supervision
//!
//! Supervises two long-running workers with auto-restart, memory
//! ceilings, and per-process log files, until Ctrl-C.
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::Arc;
use std::time::Duration;

use procvisor::{
    EventLog, LogPaths, ProcessSpec, RestartPolicy, SpecStore, Subscribe, Supervisor,
    SupervisorConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    std::fs::create_dir_all("logs")?;

    let specs = vec![
        ProcessSpec::builder("web", "/bin/sh")
            .args(["-c", "while true; do echo serving; sleep 2; done"])
            .env("PORT", "3000")
            .restart(RestartPolicy::Always)
            .max_restarts(Some(16))
            .max_memory(Some(2 * 1024 * 1024 * 1024))
            .kill_timeout(Duration::from_secs(5))
            .logs(
                LogPaths::new("logs/web-out.log", "logs/web-error.log")
                    .combined("logs/web-combined.log")
                    .timestamps(),
            )
            .build(),
        ProcessSpec::builder("api", "/bin/sh")
            .args(["-c", "while true; do echo handling; sleep 3; done"])
            .env("PORT", "5555")
            .restart(RestartPolicy::Always)
            .max_restarts(Some(16))
            .logs(
                LogPaths::new("logs/api-out.log", "logs/api-error.log")
                    .combined("logs/api-combined.log")
                    .timestamps(),
            )
            .build(),
    ];

    let store = SpecStore::load(specs)?;
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(EventLog::new())];

    let mut cfg = SupervisorConfig::default();
    cfg.grace = Duration::from_secs(10);

    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();
    sup.run(store).await?;
    Ok(())
}
