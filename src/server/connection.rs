// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config;
use crate::handler;
use crate::logger;

/// Decrements the active connection counter when the connection task ends
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    let guard = ConnectionGuard(Arc::clone(conn_counter));

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), guard);
}

/// Serve one connection in a spawned task.
///
/// Keep-alive follows `performance.keep_alive_timeout`, request headers must
/// arrive within `performance.read_timeout` and the whole connection is
/// bounded by the larger of the read and write timeouts.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    guard: ConnectionGuard,
) {
    tokio::spawn(async move {
        let _guard = guard;
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(performance.keep_alive_timeout > 0);
        if performance.read_timeout > 0 {
            builder.header_read_timeout(std::time::Duration::from_secs(performance.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}
