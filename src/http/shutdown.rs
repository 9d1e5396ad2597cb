//! Shutdown signals for the HTTP server.

use std::future::Future;

use tracing::info;

/// Future resolving on Ctrl-C, or on SIGTERM where signals exist.
///
/// Handlers are installed before this returns, so a signal delivered after
/// the call is never lost. Once exec'd from the entrypoint the server is PID 1
/// in its container, where SIGTERM has no default action.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = terminate.recv() => info!("SIGTERM received, shutting down"),
            _ = interrupt.recv() => info!("SIGINT received, shutting down"),
        }
    })
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
    })
}
