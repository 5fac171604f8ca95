//! Request and response envelope shapes exchanged with the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::command::CommandKind;

/// The kind of domain data carried by a response payload.
///
/// Strictly validated: a response naming a data kind outside this set fails
/// envelope decoding.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DataKind {
    /// No domain payload (acknowledgements, probes, errors).
    None,
    /// Board results.
    Results,
    /// Player identity records.
    PlayerData,
    /// Seating participations.
    Participations,
    /// Hand records.
    Handrecords,
}

/// Protocol-level outcome classification carried by every response.
///
/// Callers check this value; the engine never surfaces protocol conditions
/// as thrown errors. Unrecognized wire values decode to [`ErrorKind::Unknown`]
/// so a drifting host degrades a single response instead of poisoning the
/// channel.
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "camelCase")]
pub enum ErrorKind {
    /// The request succeeded.
    None,
    /// A request was already in flight; no transport I/O was performed.
    Busy,
    /// The caller sent an empty batch.
    NoData,
    /// The caller sent a batch containing nothing new.
    NoUpdates,
    /// Domain-sequencing mismatch reported by the host.
    Movement,
    /// The payload failed a shape or echo check.
    Validation,
    /// The host does not know the referenced entry.
    EntryUnknown,
    /// Unexpected failure while processing the request.
    Exception,
    /// The host recognises the command but does not implement it.
    NotImplemented,
    /// The channel yielded no response line.
    EmptyResponse,
    /// No live channel, and none could be established.
    NoConnection,
    /// The exchange exceeded its deadline.
    TimeOut,
    /// The response carried a data kind other than the expected one.
    WrongDataType,
    /// The response echoed a command other than the one sent.
    UnexpectedCommand,
    /// The host reported an error kind this client does not recognise.
    Unknown,
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Self::from_str(&text).unwrap_or(Self::Unknown))
    }
}

/// Identifier of a tournament administration unit.
///
/// Sessions correlate most commands; the identifier format itself is owned
/// by the host, so validation here is limited to what the wire can carry:
/// a non-empty token without whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a session identifier, rejecting tokens the wire cannot carry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionIdError`] when the identifier is empty or contains
    /// whitespace or control characters.
    pub fn new(identifier: impl Into<String>) -> Result<Self, SessionIdError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if let Some(found) = identifier
            .chars()
            .find(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(SessionIdError::InvalidCharacter { found });
        }
        Ok(Self(identifier))
    }

    /// The identifier as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::new(input)
    }
}

/// Errors raised when constructing a [`SessionId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionIdError {
    /// The identifier was empty.
    #[error("session identifier must not be empty")]
    Empty,
    /// The identifier contained a character the wire cannot carry.
    #[error("session identifier contains forbidden character {found:?}")]
    InvalidCharacter {
        /// The offending character.
        found: char,
    },
}

/// A single request line sent to the host.
///
/// The payload is an opaque encoded string produced by the codec; the
/// protocol engine never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The command being issued.
    pub command: CommandKind,
    /// Session identifier correlating the request, or empty for
    /// session-independent commands such as [`CommandKind::Ping`].
    pub correlation_key: String,
    /// Opaque encoded payload.
    pub payload: String,
}

impl Request {
    /// Builds a request for a session-independent command.
    #[must_use]
    pub fn new(command: CommandKind, payload: impl Into<String>) -> Self {
        Self {
            command,
            correlation_key: String::new(),
            payload: payload.into(),
        }
    }

    /// Builds a request correlated with a session.
    #[must_use]
    pub fn for_session(
        command: CommandKind,
        session: &SessionId,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            command,
            correlation_key: session.as_str().to_owned(),
            payload: payload.into(),
        }
    }
}

/// A single response line received from the host.
///
/// Immutable once decoded. The engine also synthesizes envelopes locally for
/// conditions that never reach the wire (busy rejection, missing channel,
/// decode substitution); those carry [`DataKind::None`] and a zero queue id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Echo of the command this response answers.
    pub request_command: CommandKind,
    /// Kind of domain data in the payload.
    pub data_kind: DataKind,
    /// Protocol-level outcome.
    pub error_kind: ErrorKind,
    /// Server-assigned identifier of the newest queue item in the payload,
    /// or zero when the response carries no queue data.
    pub last_queue_item_id: i64,
    /// Echo of the request's correlation key.
    pub correlation_key: String,
    /// Opaque encoded payload.
    pub payload: String,
}

impl ResponseEnvelope {
    /// Synthesizes an envelope for a condition raised client-side.
    #[must_use]
    pub fn local(
        request_command: CommandKind,
        error_kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_command,
            data_kind: DataKind::None,
            error_kind,
            last_queue_item_id: 0,
            correlation_key: String::new(),
            payload: message.into(),
        }
    }

    /// Whether the response reports success.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.error_kind, ErrorKind::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_host_response_line() {
        let line = r#"{"requestCommand":"pollNewResults","dataKind":"results","errorKind":"none","lastQueueItemId":42,"correlationKey":"191-1-3062","payload":"[]"}"#;
        let envelope: ResponseEnvelope = serde_json::from_str(line).expect("decode envelope");
        assert_eq!(envelope.request_command, CommandKind::PollNewResults);
        assert_eq!(envelope.data_kind, DataKind::Results);
        assert!(envelope.succeeded());
        assert_eq!(envelope.last_queue_item_id, 42);
    }

    #[test]
    fn unrecognized_error_kind_degrades_to_unknown() {
        let line = r#"{"requestCommand":"ping","dataKind":"none","errorKind":"powerFailure","lastQueueItemId":0,"correlationKey":"","payload":""}"#;
        let envelope: ResponseEnvelope = serde_json::from_str(line).expect("decode envelope");
        assert_eq!(envelope.error_kind, ErrorKind::Unknown);
    }

    #[test]
    fn error_kind_round_trips_camel_case() {
        let encoded = serde_json::to_string(&ErrorKind::EmptyResponse).expect("serialize");
        assert_eq!(encoded, "\"emptyResponse\"");
        let decoded: ErrorKind = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, ErrorKind::EmptyResponse);
    }

    #[test]
    fn request_serializes_camel_case_keys() {
        let session = SessionId::new("191-1-3062").expect("session id");
        let request = Request::for_session(CommandKind::AcceptResults, &session, "42");
        let encoded = serde_json::to_string(&request).expect("serialize");
        assert!(encoded.contains(r#""command":"acceptResults""#));
        assert!(encoded.contains(r#""correlationKey":"191-1-3062""#));
        assert!(encoded.contains(r#""payload":"42""#));
    }

    #[test]
    fn session_id_rejects_whitespace() {
        assert_eq!(
            SessionId::new("191 1"),
            Err(SessionIdError::InvalidCharacter { found: ' ' })
        );
        assert_eq!(SessionId::new(""), Err(SessionIdError::Empty));
    }
}
