use std::env;

use camino::Utf8PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::endpoint::Endpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 2946;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default timeout for establishing the channel, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for one request/response exchange, in milliseconds.
pub const DEFAULT_EXCHANGE_TIMEOUT_MS: u64 = 30_000;

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Computes the default endpoint for the host channel.
///
/// On Unix this is a socket underneath the user's runtime directory, falling
/// back to a uid-namespaced temp directory when no runtime directory exists.
pub fn default_endpoint() -> Endpoint {
    default_endpoint_inner()
}

#[cfg(unix)]
fn default_endpoint_inner() -> Endpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("scorelink");
    if apply_namespace {
        base.push(user_namespace());
    }

    let socket_path = base.join("scorehost.sock");
    Endpoint::unix(socket_path)
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_endpoint_inner() -> Endpoint {
    Endpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
