//! Host reachability probing.
//!
//! Lets embedding applications and the process supervisor distinguish "host
//! not running" from other connectivity failures before committing to a
//! connect attempt.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use scorelink_config::Endpoint;
use thiserror::Error;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether the host endpoint is reachable.
///
/// HTTP endpoints are stateless and always report reachable; their liveness
/// is only observable per exchange.
///
/// # Errors
///
/// Returns [`ProbeError`] for failures that indicate neither presence nor
/// absence of the host (for example permission errors), which callers should
/// surface rather than interpret.
pub fn endpoint_is_reachable(endpoint: &Endpoint) -> Result<bool, ProbeError> {
    if !endpoint.is_stream() {
        return Ok(true);
    }
    match try_connect(endpoint) {
        Ok(()) => Ok(true),
        Err(error) if is_host_absent(&error) => Ok(false),
        Err(source) => Err(ProbeError::Probe {
            endpoint: endpoint.to_string(),
            source,
        }),
    }
}

fn try_connect(endpoint: &Endpoint) -> io::Result<()> {
    match endpoint {
        Endpoint::Tcp { host, port } => {
            let address = resolve_tcp(host, *port)?;
            TcpStream::connect_timeout(&address, PROBE_TIMEOUT).map(|_| ())
        }
        Endpoint::Unix { path } => connect_unix(path.as_str()),
        Endpoint::Http { .. } => Ok(()),
    }
}

fn resolve_tcp(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved address"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<()> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, PROBE_TIMEOUT)
}

#[cfg(not(unix))]
fn connect_unix(_path: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets unsupported on this platform",
    ))
}

/// Determines whether an I/O error indicates the host is not running.
///
/// `ConnectionReset` is intentionally excluded: it means a process accepted
/// and then dropped the connection, so something is listening.
fn is_host_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotFound
            | io::ErrorKind::AddrNotAvailable
    )
}

/// Errors raised while probing the host endpoint.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe failed in a way that is neither presence nor absence.
    #[error("failed to probe host endpoint {endpoint}: {source}")]
    Probe {
        /// Endpoint being probed.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
