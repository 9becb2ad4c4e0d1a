//! Cross-platform termination-signal helper.
//!
//! The binary installs exactly one shutdown hook at the top level and sweeps
//! every live instance when it fires; instances never install their own
//! process-wide handlers.

/// Completes when the process receives a termination signal.
///
/// Listens for `SIGINT` (Ctrl-C) and `SIGTERM` on Unix, Ctrl-C elsewhere.
/// Each call creates independent listeners.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Completes when the process receives a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
