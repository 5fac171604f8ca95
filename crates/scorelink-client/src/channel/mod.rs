//! Transport channels for the host protocol.
//!
//! The [`Channel`] trait is the thin seam between the dispatcher and the
//! byte stream: line-oriented send/receive, a liveness signal, and an
//! idempotent close. No retry or correlation logic lives at this layer, so
//! the persistent stream transport and the stateless HTTP substitute swap
//! without touching the dispatcher.

use std::io;
use std::time::Duration;

use thiserror::Error;

mod http;
mod stream;

pub use http::HttpChannel;
pub use stream::StreamChannel;

use scorelink_config::{Config, Endpoint};

/// A half-duplex, line-oriented transport to the host.
///
/// `write_line` and `read_line` are blocking and may fail when the peer has
/// disappeared. `close` is idempotent and safe on an already-closed channel.
pub trait Channel {
    /// Establishes the transport, honouring the given timeout.
    ///
    /// Opening an already-open channel succeeds without reopening.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Timeout`] when the deadline elapses, which the
    /// connection manager treats as retryable; any other variant is terminal
    /// for the current connect call.
    fn open(&mut self, timeout: Duration) -> Result<(), ChannelError>;

    /// Sends one line, appending the newline delimiter and flushing.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the peer is gone or the write
    /// deadline elapses.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Blocks for one line, or `None` when the peer closed the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the read fails or the read
    /// deadline elapses.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Whether the transport currently reports itself usable.
    fn is_live(&self) -> bool;

    /// Tears the transport down. Idempotent.
    fn close(&mut self);
}

/// Errors raised while opening a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The open attempt exceeded its deadline.
    #[error("timed out opening channel to {endpoint}")]
    Timeout {
        /// Endpoint being opened.
        endpoint: String,
    },
    /// The open attempt failed for a reason other than a timeout.
    #[error("failed to open channel to {endpoint}: {source}")]
    Open {
        /// Endpoint being opened.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The endpoint host name did not resolve to an address.
    #[error("failed to resolve host address {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Underlying resolution error.
        #[source]
        source: io::Error,
    },
}

impl ChannelError {
    /// Whether this failure was a timeout, and therefore worth one retry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Production channel covering every configurable endpoint.
///
/// Mirrors the endpoint enumeration so a client can be built from
/// configuration alone; each variant delegates to its transport.
#[derive(Debug)]
pub enum HostChannel {
    /// Persistent stream transport (Unix or TCP).
    Stream(StreamChannel),
    /// Stateless HTTP substitute.
    Http(HttpChannel),
}

impl HostChannel {
    /// Builds the channel matching the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Open`] when the HTTP agent cannot be
    /// constructed.
    pub fn from_config(config: &Config) -> Result<Self, ChannelError> {
        match config.endpoint() {
            Endpoint::Unix { .. } | Endpoint::Tcp { .. } => Ok(Self::Stream(StreamChannel::new(
                config.endpoint().clone(),
                config.exchange_timeout(),
            ))),
            Endpoint::Http { url } => Ok(Self::Http(HttpChannel::new(
                url.clone(),
                config.exchange_timeout(),
            )?)),
        }
    }
}

impl Channel for HostChannel {
    fn open(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        match self {
            Self::Stream(channel) => channel.open(timeout),
            Self::Http(channel) => channel.open(timeout),
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Self::Stream(channel) => channel.write_line(line),
            Self::Http(channel) => channel.write_line(line),
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self {
            Self::Stream(channel) => channel.read_line(),
            Self::Http(channel) => channel.read_line(),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            Self::Stream(channel) => channel.is_live(),
            Self::Http(channel) => channel.is_live(),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Stream(channel) => channel.close(),
            Self::Http(channel) => channel.close(),
        }
    }
}
