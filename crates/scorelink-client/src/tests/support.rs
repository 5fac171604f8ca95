//! Scripted fake channel for engine tests.
//!
//! The fake records every call and serves canned open results and response
//! lines, so tests can drive the dispatcher and connection manager through
//! failure paths no real socket reproduces deterministically. State lives
//! behind a shared handle the test keeps for later assertions.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scorelink_config::Config;
use scorelink_wire::{
    CommandKind, DataKind, ErrorKind, QueueKind, Request, ResponseEnvelope,
};

use crate::channel::{Channel, ChannelError};
use crate::client::HostClient;
use crate::codec::JsonCodec;
use crate::supervisor::NullSupervisor;

/// Shared, inspectable state of a [`FakeChannel`].
#[derive(Debug, Default)]
pub(crate) struct FakeChannelState {
    /// Scripted outcomes for successive `open` calls; exhausted entries
    /// succeed.
    pub open_results: VecDeque<Result<(), ChannelError>>,
    /// Scripted outcomes for successive `read_line` calls; exhausted
    /// entries yield end-of-stream.
    pub responses: VecDeque<Result<Option<String>, io::ErrorKind>>,
    /// Every line written, in order.
    pub written: Vec<String>,
    /// When set, `write_line` fails with this kind instead of recording.
    pub fail_writes: Option<io::ErrorKind>,
    /// When set and no response is scripted, `read_line` echoes the last
    /// written request back as a successful envelope.
    pub echo_requests: bool,
    pub open_calls: usize,
    pub write_calls: usize,
    pub read_calls: usize,
    pub live: bool,
}

pub(crate) type FakeHandle = Arc<Mutex<FakeChannelState>>;

/// Channel double serving scripted outcomes.
#[derive(Debug)]
pub(crate) struct FakeChannel {
    state: FakeHandle,
}

impl FakeChannel {
    pub fn new() -> (Self, FakeHandle) {
        let state: FakeHandle = Arc::default();
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }

    fn echo_last_request(state: &FakeChannelState) -> Option<String> {
        let last = state.written.last()?;
        let request: Request = serde_json::from_str(last).ok()?;
        let envelope = ResponseEnvelope {
            request_command: request.command,
            data_kind: DataKind::None,
            error_kind: ErrorKind::None,
            last_queue_item_id: 0,
            correlation_key: request.correlation_key,
            payload: request.payload,
        };
        serde_json::to_string(&envelope).ok()
    }
}

impl Channel for FakeChannel {
    fn open(&mut self, _timeout: Duration) -> Result<(), ChannelError> {
        let mut state = self.state.lock().expect("fake channel state");
        state.open_calls += 1;
        match state.open_results.pop_front() {
            Some(Err(error)) => Err(error),
            Some(Ok(())) | None => {
                state.live = true;
                Ok(())
            }
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut state = self.state.lock().expect("fake channel state");
        state.write_calls += 1;
        if let Some(kind) = state.fail_writes {
            return Err(io::Error::new(kind, "injected write failure"));
        }
        state.written.push(line.to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut state = self.state.lock().expect("fake channel state");
        state.read_calls += 1;
        match state.responses.pop_front() {
            Some(Ok(line)) => Ok(line),
            Some(Err(kind)) => Err(io::Error::new(kind, "injected read failure")),
            None if state.echo_requests => Ok(Self::echo_last_request(&state)),
            None => Ok(None),
        }
    }

    fn is_live(&self) -> bool {
        self.state.lock().expect("fake channel state").live
    }

    fn close(&mut self) {
        self.state.lock().expect("fake channel state").live = false;
    }
}

pub(crate) type FakeClient = HostClient<FakeChannel, NullSupervisor, JsonCodec>;

/// Builds an unconnected client over a fresh fake channel.
pub(crate) fn fake_client() -> (FakeClient, FakeHandle) {
    let (channel, handle) = FakeChannel::new();
    let client = HostClient::new(channel, NullSupervisor, JsonCodec, &Config::default());
    (client, handle)
}

/// Builds a client whose channel has already been connected.
pub(crate) fn connected_client() -> (FakeClient, FakeHandle) {
    let (client, handle) = fake_client();
    let report = client.connect();
    assert!(report.succeeded(), "fake connect failed: {}", report.message);
    (client, handle)
}

/// Serializes a response envelope to a wire line.
pub(crate) fn envelope_line(envelope: &ResponseEnvelope) -> String {
    serde_json::to_string(envelope).expect("serialize envelope")
}

/// Wire line for a successful response without queue data.
pub(crate) fn ack_line(command: CommandKind) -> String {
    envelope_line(&ResponseEnvelope::local(command, ErrorKind::None, ""))
}

/// Wire line for a poll response delivering the given items.
pub(crate) fn poll_line(
    command: CommandKind,
    kind: QueueKind,
    last_queue_item_id: i64,
    items: &[&str],
) -> String {
    envelope_line(&ResponseEnvelope {
        request_command: command,
        data_kind: kind.data_kind(),
        error_kind: ErrorKind::None,
        last_queue_item_id,
        correlation_key: String::new(),
        payload: serde_json::to_string(items).expect("encode items"),
    })
}

/// Queues a response line on the fake channel.
pub(crate) fn queue_response(handle: &FakeHandle, line: String) {
    handle
        .lock()
        .expect("fake channel state")
        .responses
        .push_back(Ok(Some(line)));
}

/// Parses the most recently written request line.
pub(crate) fn last_request(handle: &FakeHandle) -> Request {
    let state = handle.lock().expect("fake channel state");
    let line = state.written.last().expect("a request was written");
    serde_json::from_str(line).expect("decode request")
}

/// The session used across behaviour tests.
pub(crate) fn session() -> scorelink_wire::SessionId {
    scorelink_wire::SessionId::new("191-1-3062").expect("session id")
}
