use meshroom_core::ParticipantId;
use thiserror::Error;

use crate::peer::PeerConnection;
use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Join attempted without a signed-in participant.
    #[error("a signed-in participant is required to join a room")]
    IdentityMissing,

    /// The relay channel dropped. Terminal for the session.
    #[error("signaling channel disconnected")]
    ChannelDisconnected(#[source] ChannelError),

    /// A signaling message named a participant with no registered connection.
    #[error("no peer connection registered for participant {0}")]
    UnknownPeerReference(ParticipantId),

    /// Negotiation with one participant failed. Only that connection is affected.
    #[error("negotiation with participant {participant_id} failed: {reason}")]
    NegotiationFailure {
        participant_id: ParticipantId,
        reason: String,
    },

    #[error("operation not allowed while session is {0:?}")]
    InvalidState(SessionState),
}

impl SessionError {
    /// Only channel loss ends a session; everything else is confined to one peer
    /// or is a stale message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::ChannelDisconnected(_))
    }

    pub(crate) fn negotiation(participant_id: ParticipantId, err: impl std::fmt::Display) -> Self {
        SessionError::NegotiationFailure {
            participant_id,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to relay: {0}")]
    Connect(String),

    #[error("channel is closed")]
    Closed,

    #[error("failed to encode client event")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Carries the refused connection so the caller can destroy it.
    #[error(
        "a peer connection for participant {} is already registered",
        .0.participant_id()
    )]
    Duplicate(Box<PeerConnection>),
}
