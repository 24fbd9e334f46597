// Listener module
// Creates the TCP listener through socket2 so socket options can be set before bind

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Backlog queue size passed to `listen(2)`
const BACKLOG: i32 = 128;

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEADDR` lets a restarted process bind again while old sockets sit in `TIME_WAIT`.
/// Must be called from within a Tokio runtime.
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;

    // Non-blocking mode is required before handing the socket to Tokio
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
