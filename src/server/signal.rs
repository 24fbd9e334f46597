// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
//
// There is no reload signal: the dataset is a snapshot taken at startup.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Register SIGTERM/SIGINT and notify `shutdown` on the first one received
///
/// Registration happens before returning so failures surface at startup.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    logger::log_debug(&format!(
        "Signal handlers registered (SIGTERM, SIGINT), pid {}",
        std::process::id()
    ));

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_debug(&format!("{name} received, initiating graceful shutdown"));
        shutdown.notify_one();
    });

    Ok(())
}

/// Non-unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_debug("Ctrl+C received, initiating graceful shutdown");
            shutdown.notify_one();
        }
    });

    Ok(())
}
