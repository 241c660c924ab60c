//! Graceful-shutdown plumbing.
//!
//! The loop checks a watch flag between iterations, so flipping it lets an
//! in-flight dequeue/dispatch finish before the worker exits.

use tokio::sync::watch;
use tracing::{error, info};

/// Creates the shutdown flag channel. The receiver goes to
/// [`Worker::run`](crate::worker::Worker::run); the sender to
/// [`wait_for_shutdown`].
#[must_use]
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Waits for SIGINT or SIGTERM, then flips the shutdown flag.
pub async fn wait_for_shutdown(tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
    let _ = tx.send(true);
}
