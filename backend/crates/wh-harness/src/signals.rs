//! OS signal wiring.

use crate::ShutdownCoordinator;

use std::sync::OnceLock;

use log::{info, warn};

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Forward Ctrl+C (and SIGTERM on Unix) to `coordinator`.
///
/// Installs at most once per process; returns `false` when a handler was
/// already installed. Must be called from within a tokio runtime.
pub fn install(coordinator: &ShutdownCoordinator) -> bool {
    if INSTALLED.set(()).is_err() {
        return false;
    }

    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        coordinator.shutdown();
    });
    true
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {e}");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C");
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {e}");
                sigterm.recv().await;
                info!("Received SIGTERM");
            }
        },
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
