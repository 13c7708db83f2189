//! # Termination signals.
//!
//! [`wait_for_shutdown_signal`] completes on the first of:
//! - **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`, or Ctrl-C
//! - **elsewhere:** Ctrl-C

/// Waits for a termination signal.
///
/// Fails only when a handler cannot be registered; the runtime reports that as
/// `RuntimeError::Signal`.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let which = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl_c",
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = which, "termination signal received");
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl_c", "termination signal received");
    Ok(())
}
