//! # Demo: driving the command surface
//!
//! Starts a worker, then exercises stop / start / restart / status /
//! delete from another task, and finally shuts the supervisor down.
//!
//! ## Run
//! ```bash
//! cargo run --example control
//! ```

use std::sync::Arc;
use std::time::Duration;

use procvisor::{
    EventLog, ProcessSpec, RestartPolicy, SpecStore, Subscribe, Supervisor, SupervisorConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = SpecStore::load(vec![ProcessSpec::builder("worker", "/bin/sh")
        .args(["-c", "sleep 600"])
        .restart(RestartPolicy::Always)
        .build()])?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(EventLog::new())];
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_subscribers(subs)
        .build();

    let runner = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move { sup.run(store).await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    print_status(&sup, "after start").await;

    sup.stop("worker").await?;
    print_status(&sup, "after stop").await;

    sup.start("worker").await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    print_status(&sup, "after start again").await;

    sup.restart("worker").await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    print_status(&sup, "after restart").await;

    sup.delete("worker").await?;
    print_status(&sup, "after delete").await;

    sup.shutdown();
    runner.await??;
    Ok(())
}

async fn print_status(sup: &Supervisor, label: &str) {
    println!("== {label} ==");
    for p in sup.status().await {
        println!(
            "  {}#{} {} pid={:?} restarts={}",
            p.name, p.instance, p.state, p.pid, p.restarts
        );
    }
}
