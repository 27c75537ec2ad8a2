use crate::model::chat::ChatMessage;
use crate::model::participant::{Member, Participant, ParticipantId};
use crate::model::room::RoomId;
use crate::model::signaling::{IceServerConfig, SignalPayload};
use serde::{Deserialize, Serialize};

/// Frames a client sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom {
        room_id: RoomId,
        participant: Participant,
    },
    SendOffer {
        target_participant_id: ParticipantId,
        caller: Member,
        signal: SignalPayload,
    },
    /// `caller` is the member whose offer is being answered.
    SendAnswer {
        signal: SignalPayload,
        caller: Member,
    },
    ChatMessage(ChatMessage),
}

/// Frames the relay delivers to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RelayEvent {
    Welcome {
        participant_id: ParticipantId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    /// Existing members of the room, in join order, never including the recipient.
    MembershipSnapshot(Vec<Member>),
    PeerArrived {
        signal: SignalPayload,
        caller: Member,
    },
    PeerAnswered {
        participant_id: ParticipantId,
        signal: SignalPayload,
    },
    PeerDeparted(ParticipantId),
    ChatMessageBroadcast(ChatMessage),
}

impl RelayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Welcome { .. } => "welcome",
            RelayEvent::IceConfig { .. } => "ice-config",
            RelayEvent::MembershipSnapshot(_) => "membership-snapshot",
            RelayEvent::PeerArrived { .. } => "peer-arrived",
            RelayEvent::PeerAnswered { .. } => "peer-answered",
            RelayEvent::PeerDeparted(_) => "peer-departed",
            RelayEvent::ChatMessageBroadcast(_) => "chat-message-broadcast",
        }
    }
}
