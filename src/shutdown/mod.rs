//! Graceful shutdown wiring for the client binary.
//!
//! This is the page-unload hook of the original: when the process is asked
//! to exit, the live transport gets a best-effort close. Completion before
//! teardown is not guaranteed.

use tokio::signal;
use tokio::sync::broadcast;

/// Wait for Ctrl+C or SIGTERM, then fire the shutdown signal.
pub async fn wait_for_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, closing connection");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, closing connection");
        }
    }

    let _ = shutdown_tx.send(());
}
