//! Channel lifecycle: bounded-retry connect and guarded teardown.

use std::time::Duration;

use scorelink_wire::ErrorKind;
use tracing::debug;

use crate::channel::{Channel, ChannelError};
use crate::supervisor::HostSupervisor;

/// How a connect call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new channel was established.
    Connected,
    /// The channel was already live; nothing was reopened.
    AlreadyConnected,
    /// No channel could be established.
    Failed,
}

/// Outcome, human-readable message, and error classification of a connect
/// call. Connect never panics and never propagates errors; failures are
/// reported through this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectReport {
    /// How the call concluded.
    pub outcome: ConnectOutcome,
    /// Human-readable description of the outcome.
    pub message: String,
    /// Error classification; [`ErrorKind::None`] on success.
    pub error_kind: ErrorKind,
}

impl ConnectReport {
    pub(crate) fn success(outcome: ConnectOutcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            message: message.into(),
            error_kind: ErrorKind::None,
        }
    }

    pub(crate) fn failure(message: impl Into<String>, error_kind: ErrorKind) -> Self {
        Self {
            outcome: ConnectOutcome::Failed,
            message: message.into(),
            error_kind,
        }
    }

    /// Whether the channel is live after this call.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, ConnectOutcome::Failed)
    }
}

/// Owns the channel and its lifecycle state.
///
/// The manager is the only component that mutates connection state. A
/// channel is *attached* between a successful connect and an explicit
/// disconnect; a broken transport mid-session drops the live stream but
/// keeps the attachment, so the next dispatch reconnects instead of failing
/// outright.
#[derive(Debug)]
pub struct ConnectionManager<C> {
    channel: C,
    attached: bool,
    connect_timeout: Duration,
}

impl<C: Channel> ConnectionManager<C> {
    /// Wraps a channel with the given connect timeout.
    pub const fn new(channel: C, connect_timeout: Duration) -> Self {
        Self {
            channel,
            attached: false,
            connect_timeout,
        }
    }

    /// Whether a connect has succeeded and no disconnect has happened since.
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the channel is attached and its transport reports live.
    pub fn is_live(&self) -> bool {
        self.attached && self.channel.is_live()
    }

    /// The channel, for dispatch I/O.
    pub const fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Establishes the channel.
    ///
    /// An already-live channel succeeds immediately without reopening.
    /// Otherwise the supervisor is consulted first; refusal fails the call
    /// with no open attempt. The open itself runs at most twice: once, and
    /// one more time only when the first attempt timed out.
    pub fn connect<S: HostSupervisor>(&mut self, supervisor: &S) -> ConnectReport {
        if self.is_live() {
            return ConnectReport::success(ConnectOutcome::AlreadyConnected, "already connected");
        }
        if !supervisor.ensure_host_running(false) {
            return ConnectReport::failure(
                "host process is not available",
                ErrorKind::NoConnection,
            );
        }
        match self.open_with_retry() {
            Ok(()) => {
                self.attached = true;
                ConnectReport::success(ConnectOutcome::Connected, "connected")
            }
            Err(error) => ConnectReport::failure(error.to_string(), ErrorKind::NoConnection),
        }
    }

    fn open_with_retry(&mut self) -> Result<(), ChannelError> {
        match self.channel.open(self.connect_timeout) {
            Ok(()) => Ok(()),
            Err(error) if error.is_timeout() => {
                debug!(
                    target: "scorelink::connection",
                    %error,
                    "open timed out, retrying once"
                );
                self.channel.open(self.connect_timeout)
            }
            Err(error) => Err(error),
        }
    }

    /// Tears the channel down, optionally notifying the peer first.
    ///
    /// The notify line is written and its response consumed best-effort: the
    /// peer may already have torn down its side, so failures are logged and
    /// swallowed, and the close runs regardless.
    pub fn disconnect(&mut self, notify_line: Option<&str>) {
        if let Some(line) = notify_line
            && self.is_live()
        {
            match self.channel.write_line(line) {
                Ok(()) => {
                    if let Err(error) = self.channel.read_line() {
                        debug!(
                            target: "scorelink::connection",
                            %error,
                            "peer did not answer the disconnect notification"
                        );
                    }
                }
                Err(error) => {
                    debug!(
                        target: "scorelink::connection",
                        %error,
                        "failed to notify peer of disconnect"
                    );
                }
            }
        }
        self.channel.close();
        self.attached = false;
    }

    /// Drops the live transport after an I/O failure, keeping the
    /// attachment so the next dispatch reconnects.
    pub fn drop_channel(&mut self) {
        self.channel.close();
    }
}
