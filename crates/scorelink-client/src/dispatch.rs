//! Single-flight command dispatch.
//!
//! One request may be in transit per client instance at any time. The gate
//! is checked before any transport work and released through an RAII guard,
//! so no failure path — early return, I/O error, or panic — can leave the
//! client permanently unable to issue further commands.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use scorelink_wire::{ErrorKind, Request, ResponseEnvelope};
use tracing::{debug, error};

use crate::channel::Channel;
use crate::codec::Codec;
use crate::connection::ConnectionManager;
use crate::supervisor::HostSupervisor;

/// The single-flight gate.
///
/// Invariant: at most one engaged observation per client instance at any
/// time. Callers that find the gate engaged are rejected, never queued.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
    engaged: AtomicBool,
}

impl SingleFlight {
    pub(crate) const fn new() -> Self {
        Self {
            engaged: AtomicBool::new(false),
        }
    }

    /// Engages the gate, or returns `None` when a request is in transit.
    pub(crate) fn try_engage(&self) -> Option<FlightGuard<'_>> {
        self.engaged
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flight: self })
    }
}

/// Clears the gate when dropped, on every exit path.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.engaged.store(false, Ordering::Release);
    }
}

/// Performs one half-duplex exchange: write exactly one line, then block
/// for exactly one line.
///
/// The caller holds the flight guard. Failures come back as envelope values:
/// a channel that was never connected yields `NoConnection` without I/O; a
/// dead transport triggers one reconnect through the standard policy; an
/// I/O failure mid-exchange closes the transport (forcing the next call to
/// reconnect) and is classified as `NoConnection` or `TimeOut`; an
/// undecodable response line is substituted with a synthesized `Exception`
/// envelope.
pub(crate) fn exchange<C, S, K>(
    manager: &mut ConnectionManager<C>,
    supervisor: &S,
    codec: &K,
    request: &Request,
) -> ResponseEnvelope
where
    C: Channel,
    S: HostSupervisor,
    K: Codec,
{
    if !manager.is_attached() {
        return ResponseEnvelope::local(
            request.command,
            ErrorKind::NoConnection,
            "channel has not been connected",
        );
    }
    if !manager.is_live() {
        debug!(
            target: "scorelink::dispatch",
            command = %request.command,
            "transport is down, reconnecting"
        );
        let report = manager.connect(supervisor);
        if !report.succeeded() {
            return ResponseEnvelope::local(request.command, ErrorKind::NoConnection, report.message);
        }
    }

    let line = match codec.encode(request) {
        Ok(line) => line,
        Err(failure) => {
            return ResponseEnvelope::local(
                request.command,
                ErrorKind::Exception,
                failure.to_string(),
            );
        }
    };

    if let Err(failure) = manager.channel_mut().write_line(&line) {
        manager.drop_channel();
        return ResponseEnvelope::local(
            request.command,
            classify_io_failure(&failure),
            failure.to_string(),
        );
    }

    match manager.channel_mut().read_line() {
        Ok(Some(answer)) if !answer.trim().is_empty() => {
            decode_envelope(codec, &answer, request.command)
        }
        Ok(_) => ResponseEnvelope::local(
            request.command,
            ErrorKind::EmptyResponse,
            "host yielded no response line",
        ),
        Err(failure) => {
            manager.drop_channel();
            ResponseEnvelope::local(
                request.command,
                classify_io_failure(&failure),
                failure.to_string(),
            )
        }
    }
}

fn classify_io_failure(failure: &io::Error) -> ErrorKind {
    if matches!(
        failure.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    ) {
        ErrorKind::TimeOut
    } else {
        ErrorKind::NoConnection
    }
}

fn decode_envelope<K: Codec>(
    codec: &K,
    line: &str,
    command: scorelink_wire::CommandKind,
) -> ResponseEnvelope {
    match codec.decode::<ResponseEnvelope>(line) {
        Ok(envelope) => envelope,
        Err(failure) => {
            error!(
                target: "scorelink::dispatch",
                %command,
                %failure,
                "response line failed to decode, substituting an error envelope"
            );
            ResponseEnvelope::local(command, ErrorKind::Exception, failure.to_string())
        }
    }
}
