//! The client facade.
//!
//! [`HostClient`] threads the channel, connection manager, dispatcher,
//! queue tracker, supervisor, and codec together behind one owned handle.
//! Construct it once at process start and pass it explicitly to callers;
//! the "one live channel per peer identity" invariant is the instance
//! boundary, not a hidden global.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use scorelink_config::Config;
use scorelink_wire::{
    CommandKind, ErrorKind, QueueKind, Request, ResponseEnvelope, SessionId,
};

use crate::channel::{Channel, ChannelError, HostChannel};
use crate::codec::{Codec, JsonCodec};
use crate::connection::{ConnectReport, ConnectionManager};
use crate::dispatch::{self, SingleFlight};
use crate::supervisor::{HostSupervisor, ProcessSupervisor};
use crate::sync::{self, QueueTracker};

/// Client for exchanging tournament data with the host.
///
/// All operations take `&self` and return response values carrying an
/// [`ErrorKind`]; protocol-level conditions are never surfaced as panics or
/// `Err` returns. Concurrent calls are rejected with [`ErrorKind::Busy`],
/// not queued — retry and backoff policy belongs to the caller.
pub struct HostClient<C, S, K = JsonCodec> {
    flight: SingleFlight,
    inner: Mutex<Engine<C>>,
    supervisor: S,
    codec: K,
}

struct Engine<C> {
    manager: ConnectionManager<C>,
    tracker: QueueTracker,
}

/// Production client over the configurable transport set.
pub type ScorelinkClient = HostClient<HostChannel, ProcessSupervisor, JsonCodec>;

impl ScorelinkClient {
    /// Builds the production client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the configured transport cannot be
    /// constructed (for example an HTTP agent failing to build).
    pub fn from_config(config: &Config) -> Result<Self, ChannelError> {
        let channel = HostChannel::from_config(config)?;
        let supervisor = ProcessSupervisor::new(config.endpoint().clone());
        Ok(Self::new(channel, supervisor, JsonCodec, config))
    }
}

impl<C, S, K> HostClient<C, S, K>
where
    C: Channel,
    S: HostSupervisor,
    K: Codec,
{
    /// Assembles a client from its collaborators.
    pub fn new(channel: C, supervisor: S, codec: K, config: &Config) -> Self {
        Self {
            flight: SingleFlight::new(),
            inner: Mutex::new(Engine {
                manager: ConnectionManager::new(channel, config.connect_timeout()),
                tracker: QueueTracker::new(),
            }),
            supervisor,
            codec,
        }
    }

    /// Establishes the channel to the host.
    pub fn connect(&self) -> ConnectReport {
        let Some(_guard) = self.flight.try_engage() else {
            return ConnectReport::failure("a request is already in transit", ErrorKind::Busy);
        };
        let mut inner = self.lock_inner();
        inner.manager.connect(&self.supervisor)
    }

    /// Notifies the peer best-effort and tears the channel down.
    pub fn disconnect(&self) -> ResponseEnvelope {
        let Some(_guard) = self.flight.try_engage() else {
            return ResponseEnvelope::local(
                CommandKind::Disconnect,
                ErrorKind::Busy,
                "a request is already in transit",
            );
        };
        let mut inner = self.lock_inner();
        let notify = self
            .codec
            .encode(&Request::new(CommandKind::Disconnect, ""))
            .ok();
        inner.manager.disconnect(notify.as_deref());
        ResponseEnvelope::local(CommandKind::Disconnect, ErrorKind::None, "disconnected")
    }

    /// Whether the channel is currently live.
    pub fn is_connected(&self) -> bool {
        self.lock_inner().manager.is_live()
    }

    /// Issues one request and blocks for its response.
    ///
    /// The lowest-level operation: single-flight guarded, half-duplex, and
    /// echo-validated. Every higher-level operation goes through here.
    pub fn send(&self, request: Request) -> ResponseEnvelope {
        let Some(_guard) = self.flight.try_engage() else {
            return ResponseEnvelope::local(
                request.command,
                ErrorKind::Busy,
                "a request is already in transit",
            );
        };
        let mut inner = self.lock_inner();
        let envelope =
            dispatch::exchange(&mut inner.manager, &self.supervisor, &self.codec, &request);
        Self::check_echo(request.command, envelope)
    }

    /// Liveness probe: sends a fresh random token the host must echo
    /// byte-identically.
    ///
    /// A transport-level success with a mismatched echo reports
    /// [`ErrorKind::Validation`].
    pub fn ping(&self) -> ResponseEnvelope {
        let token = Uuid::new_v4().to_string();
        let envelope = self.send(Request::new(CommandKind::Ping, token.clone()));
        if envelope.succeeded() && envelope.payload != token {
            return ResponseEnvelope::local(
                CommandKind::Ping,
                ErrorKind::Validation,
                "host echoed a mismatched probe token",
            );
        }
        envelope
    }

    /// Registers a tournament event with the host.
    pub fn initialize_event<T: Serialize>(
        &self,
        session: &SessionId,
        event: &T,
    ) -> ResponseEnvelope {
        self.send_payload(CommandKind::InitializeEvent, session, event)
    }

    /// Sends a batch of domain records for an already-initialized event.
    pub fn send_update<T: Serialize>(&self, session: &SessionId, batch: &T) -> ResponseEnvelope {
        self.send_payload(CommandKind::UpdateEvent, session, batch)
    }

    /// Polls for items not yet delivered on the given stream.
    ///
    /// Returns the encoded items; failures (including a busy gate) are
    /// logged and yield an empty list. A non-empty delivery advances the
    /// stream's cursor to the server-reported id.
    pub fn poll_new(&self, kind: QueueKind, session: &SessionId) -> Vec<String> {
        self.poll(kind, session, kind.poll_new_command())
    }

    /// Polls for the complete backlog of the given stream, ignoring prior
    /// acceptance.
    ///
    /// Rebuilds consumer state after a crash or a lost accept; server-side
    /// delivery bookkeeping is not touched.
    pub fn poll_all(&self, kind: QueueKind, session: &SessionId) -> Vec<String> {
        self.poll(kind, session, kind.poll_all_command())
    }

    /// Acknowledges delivery up to the stream's cached cursor.
    ///
    /// Sends exactly the cursor recorded by the last successful poll — never
    /// a recomputed value. Before any poll has succeeded for the stream
    /// there is nothing meaningful to accept, and the call fails with
    /// [`ErrorKind::Validation`] without touching the transport.
    pub fn accept(&self, kind: QueueKind, session: &SessionId) -> ResponseEnvelope {
        let command = kind.accept_command();
        let Some(cursor) = self.lock_inner().tracker.cursor(kind) else {
            return ResponseEnvelope::local(
                command,
                ErrorKind::Validation,
                "no delivery to accept yet for this stream",
            );
        };
        self.send(Request::for_session(command, session, cursor.to_string()))
    }

    /// Last-seen queue item id for the stream, or `None` before the first
    /// successful poll.
    pub fn cursor(&self, kind: QueueKind) -> Option<i64> {
        self.lock_inner().tracker.cursor(kind)
    }

    fn poll(&self, kind: QueueKind, session: &SessionId, command: CommandKind) -> Vec<String> {
        let envelope = self.send(Request::for_session(command, session, ""));
        let mut inner = self.lock_inner();
        sync::items_from_poll(&self.codec, kind, &envelope, &mut inner.tracker)
    }

    fn send_payload<T: Serialize>(
        &self,
        command: CommandKind,
        session: &SessionId,
        value: &T,
    ) -> ResponseEnvelope {
        match self.codec.encode(value) {
            Ok(payload) => self.send(Request::for_session(command, session, payload)),
            Err(failure) => {
                ResponseEnvelope::local(command, ErrorKind::Validation, failure.to_string())
            }
        }
    }

    fn check_echo(command: CommandKind, envelope: ResponseEnvelope) -> ResponseEnvelope {
        if envelope.request_command == command {
            return envelope;
        }
        warn!(
            target: "scorelink::client",
            sent = %command,
            answered = %envelope.request_command,
            "host answered a different command than the one in transit"
        );
        ResponseEnvelope::local(
            command,
            ErrorKind::UnexpectedCommand,
            format!(
                "host answered {} while {} was pending",
                envelope.request_command, command
            ),
        )
    }

    fn lock_inner(&self) -> MutexGuard<'_, Engine<C>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    pub(crate) fn engage_flight_for_test(&self) -> Option<crate::dispatch::FlightGuard<'_>> {
        self.flight.try_engage()
    }
}
