//! Command kinds and the catalog mapping queue kinds to their commands.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::envelope::DataKind;

/// The closed set of requests a client may issue to the host.
///
/// The wire representation is the camelCase variant name. Unknown command
/// strings fail envelope decoding outright; a peer speaking commands outside
/// this set is not a peer this protocol can talk to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum CommandKind {
    /// Liveness probe; the host echoes the payload verbatim.
    Ping,
    /// Best-effort notification that the client is closing its channel.
    Disconnect,
    /// Registers a tournament event with the host.
    InitializeEvent,
    /// Sends a batch of domain records for an already-initialized event.
    UpdateEvent,
    /// Retrieves results not yet delivered to this client.
    PollNewResults,
    /// Retrieves the complete result backlog, ignoring delivery state.
    PollAllResults,
    /// Acknowledges results up to the client's cached cursor.
    AcceptResults,
    /// Retrieves player records not yet delivered to this client.
    PollNewPlayerData,
    /// Retrieves the complete player-record backlog.
    PollAllPlayerData,
    /// Acknowledges player records up to the client's cached cursor.
    AcceptPlayerData,
    /// Retrieves seating participations not yet delivered to this client.
    PollNewParticipations,
    /// Retrieves the complete participation backlog.
    PollAllParticipations,
    /// Acknowledges participations up to the client's cached cursor.
    AcceptParticipations,
    /// Retrieves hand records not yet delivered to this client.
    PollNewHandrecords,
    /// Retrieves the complete hand-record backlog.
    PollAllHandrecords,
    /// Acknowledges hand records up to the client's cached cursor.
    AcceptHandrecords,
}

impl CommandKind {
    /// The data kind a well-formed response to this command must carry.
    ///
    /// Non-queue commands yield [`DataKind::None`]; poll commands yield the
    /// data kind of their stream. Accept commands are acknowledgements and
    /// also yield [`DataKind::None`].
    #[must_use]
    pub const fn expected_data_kind(self) -> DataKind {
        match self {
            Self::PollNewResults | Self::PollAllResults => DataKind::Results,
            Self::PollNewPlayerData | Self::PollAllPlayerData => DataKind::PlayerData,
            Self::PollNewParticipations | Self::PollAllParticipations => DataKind::Participations,
            Self::PollNewHandrecords | Self::PollAllHandrecords => DataKind::Handrecords,
            Self::Ping
            | Self::Disconnect
            | Self::InitializeEvent
            | Self::UpdateEvent
            | Self::AcceptResults
            | Self::AcceptPlayerData
            | Self::AcceptParticipations
            | Self::AcceptHandrecords => DataKind::None,
        }
    }
}

/// The four append-only streams the host delivers incrementally.
///
/// Each stream has its own cursor on the client side and its own trio of
/// poll-new, poll-all, and accept commands in the catalog.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum QueueKind {
    /// Board results scored at the tables.
    Results,
    /// Player identity records entered at the tables.
    PlayerData,
    /// Seating participations (who sits where, per round).
    Participations,
    /// Hand records (deals) captured or published for the session.
    Handrecords,
}

impl QueueKind {
    /// All queue kinds, in catalog order.
    pub const ALL: [Self; 4] = [
        Self::Results,
        Self::PlayerData,
        Self::Participations,
        Self::Handrecords,
    ];

    /// The command retrieving only undelivered items for this stream.
    #[must_use]
    pub const fn poll_new_command(self) -> CommandKind {
        match self {
            Self::Results => CommandKind::PollNewResults,
            Self::PlayerData => CommandKind::PollNewPlayerData,
            Self::Participations => CommandKind::PollNewParticipations,
            Self::Handrecords => CommandKind::PollNewHandrecords,
        }
    }

    /// The command retrieving the complete backlog for this stream.
    #[must_use]
    pub const fn poll_all_command(self) -> CommandKind {
        match self {
            Self::Results => CommandKind::PollAllResults,
            Self::PlayerData => CommandKind::PollAllPlayerData,
            Self::Participations => CommandKind::PollAllParticipations,
            Self::Handrecords => CommandKind::PollAllHandrecords,
        }
    }

    /// The command acknowledging delivery for this stream.
    #[must_use]
    pub const fn accept_command(self) -> CommandKind {
        match self {
            Self::Results => CommandKind::AcceptResults,
            Self::PlayerData => CommandKind::AcceptPlayerData,
            Self::Participations => CommandKind::AcceptParticipations,
            Self::Handrecords => CommandKind::AcceptHandrecords,
        }
    }

    /// The data kind carried by poll responses for this stream.
    #[must_use]
    pub const fn data_kind(self) -> DataKind {
        match self {
            Self::Results => DataKind::Results,
            Self::PlayerData => DataKind::PlayerData,
            Self::Participations => DataKind::Participations,
            Self::Handrecords => DataKind::Handrecords,
        }
    }
}
