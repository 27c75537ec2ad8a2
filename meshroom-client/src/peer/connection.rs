use meshroom_core::{Member, ParticipantId, SignalPayload};
use std::fmt;
use tracing::{debug, warn};

use crate::peer::{ConnectionSerial, NegotiationAgent, PeerRole, RemoteStream};

/// Lifecycle of one peer connection.
///
/// `Created -> OfferApplied (responder only) -> SignalExchanged -> Connected`,
/// with `Destroyed` reachable from anywhere and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Created,
    OfferApplied,
    SignalExchanged,
    /// The remote stream arrived.
    Connected,
    Destroyed,
}

/// The local half of a negotiated link with exactly one remote participant.
pub struct PeerConnection {
    remote: Member,
    role: PeerRole,
    serial: ConnectionSerial,
    state: NegotiationState,
    remote_stream: Option<RemoteStream>,
    answer_applied: bool,
    agent: Box<dyn NegotiationAgent>,
}

impl PeerConnection {
    pub(crate) fn new(
        remote: Member,
        role: PeerRole,
        serial: ConnectionSerial,
        agent: Box<dyn NegotiationAgent>,
    ) -> Self {
        Self {
            remote,
            role,
            serial,
            state: NegotiationState::Created,
            remote_stream: None,
            answer_applied: false,
            agent,
        }
    }

    pub fn remote(&self) -> &Member {
        &self.remote
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.remote.participant_id
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn serial(&self) -> ConnectionSerial {
        self.serial
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == NegotiationState::Destroyed
    }

    /// Responder only: hand the caller's offer to the agent.
    pub(crate) async fn apply_offer(&mut self, offer: SignalPayload) -> anyhow::Result<()> {
        if self.role != PeerRole::Responder || self.state != NegotiationState::Created {
            anyhow::bail!(
                "cannot apply an offer to a {:?} connection in state {:?}",
                self.role,
                self.state
            );
        }
        self.agent.apply_remote_signal(offer).await?;
        self.state = NegotiationState::OfferApplied;
        Ok(())
    }

    /// The agent emitted its local negotiation message: the initiator's offer
    /// or the responder's answer is on its way.
    pub(crate) fn record_local_signal(&mut self) {
        let ready = match self.role {
            PeerRole::Initiator => self.state == NegotiationState::Created,
            PeerRole::Responder => self.state == NegotiationState::OfferApplied,
        };
        if ready {
            self.state = NegotiationState::SignalExchanged;
        }
    }

    /// Initiator only. Returns `Ok(false)` when the answer is not expected
    /// (replayed, or sent to a responder) and was ignored.
    pub(crate) async fn apply_answer(&mut self, answer: SignalPayload) -> anyhow::Result<bool> {
        let expected = self.role == PeerRole::Initiator
            && !self.answer_applied
            && matches!(
                self.state,
                NegotiationState::Created | NegotiationState::SignalExchanged
            );
        if !expected {
            debug!(
                "Ignoring answer from {} in state {:?} ({:?})",
                self.participant_id(),
                self.state,
                self.role
            );
            return Ok(false);
        }
        self.agent.apply_remote_signal(answer).await?;
        self.answer_applied = true;
        self.state = NegotiationState::SignalExchanged;
        Ok(true)
    }

    /// Returns `true` only for the first stream; that is when observers are told.
    pub(crate) fn record_stream(&mut self, stream: RemoteStream) -> bool {
        match self.state {
            NegotiationState::Connected | NegotiationState::Destroyed => false,
            _ => {
                self.remote_stream = Some(stream);
                self.state = NegotiationState::Connected;
                true
            }
        }
    }

    pub(crate) async fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.state = NegotiationState::Destroyed;
        if let Err(e) = self.agent.close().await {
            warn!(
                "Failed to close negotiation agent for {}: {:?}",
                self.participant_id(),
                e
            );
        }
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("remote", &self.remote.participant_id)
            .field("role", &self.role)
            .field("serial", &self.serial)
            .field("state", &self.state)
            .finish()
    }
}
