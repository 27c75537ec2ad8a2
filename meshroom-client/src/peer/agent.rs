use async_trait::async_trait;
use meshroom_core::{
    IceServerConfig, Member, ParticipantId, SignalEnvelope, SignalKind, SignalPayload,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::media::{LocalMedia, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    /// Produces the offer. Created for members already present at join time.
    Initiator,
    /// Applies a received offer and produces the answer.
    Responder,
}

/// Per-session sequence number of a peer connection. Lets the session tell a
/// live connection's events from those of one it already destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionSerial(pub u64);

impl fmt::Display for ConnectionSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

#[derive(Debug)]
pub enum PeerEventKind {
    /// A negotiation message to forward to the remote participant.
    Signal(SignalEnvelope),
    /// Remote media became available.
    Stream(RemoteStream),
    /// Transport-level negotiation failure.
    Failed(String),
}

#[derive(Debug)]
pub struct PeerEvent {
    pub participant_id: ParticipantId,
    pub serial: ConnectionSerial,
    pub kind: PeerEventKind,
}

/// Handle an agent uses to report back to its session.
///
/// Emission never blocks and is silently dropped once the session is gone.
#[derive(Clone)]
pub struct AgentEmitter {
    participant_id: ParticipantId,
    serial: ConnectionSerial,
    role: PeerRole,
    tx: mpsc::UnboundedSender<PeerEvent>,
}

impl AgentEmitter {
    pub(crate) fn new(
        participant_id: ParticipantId,
        serial: ConnectionSerial,
        role: PeerRole,
        tx: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self {
        Self {
            participant_id,
            serial,
            role,
            tx,
        }
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    /// Wraps `payload` as an offer or answer bundle depending on the agent's role.
    pub fn local_signal(&self, payload: SignalPayload) {
        let kind = match self.role {
            PeerRole::Initiator => SignalKind::OfferBundle,
            PeerRole::Responder => SignalKind::AnswerBundle,
        };
        self.emit(PeerEventKind::Signal(SignalEnvelope {
            kind,
            target: self.participant_id,
            payload,
        }));
    }

    pub fn remote_stream(&self, stream: RemoteStream) {
        self.emit(PeerEventKind::Stream(stream));
    }

    pub fn failed(&self, reason: impl fmt::Display) {
        self.emit(PeerEventKind::Failed(reason.to_string()));
    }

    fn emit(&self, kind: PeerEventKind) {
        let _ = self.tx.send(PeerEvent {
            participant_id: self.participant_id,
            serial: self.serial,
            kind,
        });
    }
}

/// What an agent needs to know at construction.
pub struct AgentSpec {
    pub role: PeerRole,
    pub remote: Member,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: Arc<LocalMedia>,
}

/// One point-to-point negotiation (ICE/SDP) with a single remote participant.
///
/// An initiator starts producing its offer as soon as it is built. A responder
/// produces its answer after its offer is applied.
#[async_trait]
pub trait NegotiationAgent: Send + Sync {
    async fn apply_remote_signal(&self, payload: SignalPayload) -> anyhow::Result<()>;

    /// Release transport and media resources.
    async fn close(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AgentBuilder: Send + Sync {
    async fn build(
        &self,
        spec: AgentSpec,
        emitter: AgentEmitter,
    ) -> anyhow::Result<Box<dyn NegotiationAgent>>;
}
