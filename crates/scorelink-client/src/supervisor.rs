//! Host process supervision.
//!
//! The connection manager consults a [`HostSupervisor`] before its first
//! open attempt; a `false` answer is an immediate no-connection failure
//! without touching the channel. Production setups either manage the host
//! externally ([`NullSupervisor`]) or let the client spawn it on demand
//! ([`ProcessSupervisor`]).

use std::env;
use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use scorelink_config::Endpoint;
use tracing::{debug, warn};

use crate::probe::endpoint_is_reachable;

/// Environment variable naming the host binary when no override is given.
pub const HOST_BINARY_ENV: &str = "SCOREHOST_BIN";

const DEFAULT_HOST_BINARY: &str = "scorehostd";
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Decides whether the host process is available before a connect attempt.
#[cfg_attr(test, mockall::automock)]
pub trait HostSupervisor {
    /// Ensures the host is running, optionally forcing a restart.
    ///
    /// Returns `false` when the host cannot be made available; the
    /// connection manager then fails the connect call without opening the
    /// channel.
    fn ensure_host_running(&self, force_restart: bool) -> bool;
}

/// Supervisor for externally managed hosts; always reports available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSupervisor;

impl HostSupervisor for NullSupervisor {
    fn ensure_host_running(&self, _force_restart: bool) -> bool {
        true
    }
}

/// Supervisor that spawns the host process on demand.
///
/// The binary is resolved from an explicit override, the
/// [`HOST_BINARY_ENV`] environment variable, or the default binary name, in
/// that order.
#[derive(Debug)]
pub struct ProcessSupervisor {
    endpoint: Endpoint,
    binary_override: Option<OsString>,
}

impl ProcessSupervisor {
    /// Builds a supervisor probing and spawning for the given endpoint.
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            binary_override: None,
        }
    }

    /// Overrides the host binary path.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<OsString>) -> Self {
        self.binary_override = Some(binary.into());
        self
    }

    fn resolve_host_binary(&self) -> OsString {
        self.binary_override
            .clone()
            .or_else(|| env::var_os(HOST_BINARY_ENV))
            .unwrap_or_else(|| OsString::from(DEFAULT_HOST_BINARY))
    }

    fn spawn_host(&self, binary: &OsStr) -> bool {
        let mut command = Command::new(binary);
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        match command.spawn() {
            Ok(child) => {
                debug!(
                    target: "scorelink::supervisor",
                    pid = child.id(),
                    "spawned host process"
                );
                true
            }
            Err(error) => {
                warn!(
                    target: "scorelink::supervisor",
                    binary = %binary.to_string_lossy(),
                    %error,
                    "failed to spawn host process"
                );
                false
            }
        }
    }

    fn wait_until_reachable(&self) -> bool {
        let deadline = Instant::now() + STARTUP_TIMEOUT;
        while Instant::now() < deadline {
            if matches!(endpoint_is_reachable(&self.endpoint), Ok(true)) {
                return true;
            }
            thread::sleep(STARTUP_POLL_INTERVAL);
        }
        warn!(
            target: "scorelink::supervisor",
            endpoint = %self.endpoint,
            "host did not become reachable before the startup deadline"
        );
        false
    }
}

impl HostSupervisor for ProcessSupervisor {
    fn ensure_host_running(&self, force_restart: bool) -> bool {
        if !force_restart && matches!(endpoint_is_reachable(&self.endpoint), Ok(true)) {
            return true;
        }
        let binary = self.resolve_host_binary();
        if !self.spawn_host(&binary) {
            return false;
        }
        self.wait_until_reachable()
    }
}
