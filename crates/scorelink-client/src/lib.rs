//! Client-side IPC engine for exchanging tournament data with the host.
//!
//! The host is a separately running control process; this crate owns the
//! command/response protocol spoken to it over a single half-duplex channel:
//! connection lifecycle with a bounded reconnect policy, single-flight
//! command dispatch with request/response correlation, and cursor-based
//! incremental synchronization of the four append-only queue streams
//! (results, player records, participations, hand records).
//!
//! The engine is deliberately not a general-purpose RPC layer: one logical
//! connection per client instance, one outstanding request at a time, and a
//! closed command set defined in `scorelink-wire`. Callers receive response
//! values carrying an error classification rather than exceptions; see
//! [`scorelink_wire::ErrorKind`] for the taxonomy.
//!
//! Typical setup:
//!
//! ```ignore
//! let config = Config::default();
//! let client = ScorelinkClient::from_config(&config)?;
//! let report = client.connect();
//! let fresh = client.poll_new(QueueKind::Results, &session);
//! client.accept(QueueKind::Results, &session);
//! ```

mod channel;
mod client;
mod codec;
mod connection;
mod dispatch;
mod probe;
mod supervisor;
mod sync;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use channel::{Channel, ChannelError, HostChannel, HttpChannel, StreamChannel};
pub use client::{HostClient, ScorelinkClient};
pub use codec::{Codec, CodecError, JsonCodec};
pub use connection::{ConnectOutcome, ConnectReport, ConnectionManager};
pub use probe::{ProbeError, endpoint_is_reachable};
pub use supervisor::{HOST_BINARY_ENV, HostSupervisor, NullSupervisor, ProcessSupervisor};
pub use sync::QueueTracker;

pub use scorelink_config::{Config, Endpoint, LogFormat};
pub use scorelink_wire::{
    CommandKind, DataKind, ErrorKind, QueueKind, Request, ResponseEnvelope, SessionId,
};
