// Server loop module
// Accepts connections until shutdown is requested, then drains in-flight ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// How often the drain phase re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Main accept loop
///
/// Runs until `shutdown` is notified. The listener is then closed and active
/// connections get up to `performance.shutdown_timeout` seconds to finish.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                logger::log_debug(&format!("Closing listener on {local_addr}"));
                break;
            }
        }
    }

    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    let remaining = drain_connections(&active_connections, grace).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

/// Wait until no connections are active or `grace` elapses; returns how many remain
async fn drain_connections(active_connections: &AtomicUsize, grace: Duration) -> usize {
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
