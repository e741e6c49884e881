//! OS termination signals for the supervisor itself.
//!
//! [`wait_for_signal`] completes when the supervisor process receives a
//! termination request: SIGINT or SIGTERM on Unix, Ctrl-C elsewhere.

/// Waits for a termination signal addressed to the supervisor.
///
/// Returns `Ok(())` on the first signal received, or `Err` if listener
/// registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Waits for a termination signal addressed to the supervisor.
#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
