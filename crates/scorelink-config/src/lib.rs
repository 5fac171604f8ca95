//! Shared configuration for the scorelink client.
//!
//! Owns the endpoint description for the host channel, the exchange and
//! connection deadlines, and the logging knobs consumed by the telemetry
//! bootstrap in `scorelink-client`. Values deserialize from any serde
//! source; embedding applications typically load a small TOML or JSON
//! fragment and hand the resulting [`Config`] to the client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_EXCHANGE_TIMEOUT_MS, DEFAULT_LOG_FILTER,
    DEFAULT_TCP_PORT, default_endpoint,
};
pub use endpoint::{Endpoint, EndpointParseError, EndpointPreparationError};
pub use logging::{LogFormat, LogFormatParseError};

/// Client configuration.
///
/// All fields have defaults so an empty configuration source yields a
/// working setup pointing at the per-user default socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Endpoint of the host channel.
    pub endpoint: Endpoint,
    /// Timeout for establishing the channel, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Deadline for one request/response exchange, in milliseconds.
    pub exchange_timeout_ms: u64,
    /// Log filter expression (tracing `EnvFilter` syntax).
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            exchange_timeout_ms: DEFAULT_EXCHANGE_TIMEOUT_MS,
            log_filter: defaults::default_log_filter_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Endpoint of the host channel.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Timeout for establishing the channel.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Deadline for one request/response exchange.
    #[must_use]
    pub const fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
