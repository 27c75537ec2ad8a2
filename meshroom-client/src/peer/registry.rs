use meshroom_core::{Participant, ParticipantId};
use tokio::sync::watch;

use crate::error::RegistryError;
use crate::peer::{NegotiationState, PeerConnection, PeerRole, RemoteStream};

/// Render-facing view of one registered peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSummary {
    pub participant_id: ParticipantId,
    pub participant: Participant,
    pub role: PeerRole,
    pub state: NegotiationState,
    pub stream: Option<RemoteStream>,
}

impl From<&PeerConnection> for PeerSummary {
    fn from(conn: &PeerConnection) -> Self {
        Self {
            participant_id: conn.participant_id(),
            participant: conn.remote().participant.clone(),
            role: conn.role(),
            state: conn.state(),
            stream: conn.remote_stream().cloned(),
        }
    }
}

/// The single source of truth for "who am I connected to".
///
/// At most one connection per remote participant, kept in insertion order.
/// Every mutation republishes the peer list to subscribers before returning.
/// Mutation is crate-private: only the room session changes it.
pub struct PeerRegistry {
    peers: Vec<PeerConnection>,
    watch_tx: watch::Sender<Vec<PeerSummary>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(Vec::new());
        Self {
            peers: Vec::new(),
            watch_tx,
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.find(participant_id).is_some()
    }

    pub fn find(&self, participant_id: &ParticipantId) -> Option<&PeerConnection> {
        self.peers
            .iter()
            .find(|p| &p.participant_id() == participant_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerConnection> {
        self.peers.iter()
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        self.peers.iter().map(|p| p.participant_id()).collect()
    }

    pub fn summaries(&self) -> Vec<PeerSummary> {
        self.peers.iter().map(PeerSummary::from).collect()
    }

    /// Ordered peer list, refreshed after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<PeerSummary>> {
        self.watch_tx.subscribe()
    }

    pub(crate) fn find_mut(&mut self, participant_id: &ParticipantId) -> Option<&mut PeerConnection> {
        self.peers
            .iter_mut()
            .find(|p| &p.participant_id() == participant_id)
    }

    /// Refuses a second connection for the same participant and hands it back.
    pub(crate) fn add(&mut self, conn: PeerConnection) -> Result<(), RegistryError> {
        if self.contains(&conn.participant_id()) {
            return Err(RegistryError::Duplicate(Box::new(conn)));
        }
        self.peers.push(conn);
        self.publish();
        Ok(())
    }

    pub(crate) fn remove(&mut self, participant_id: &ParticipantId) -> Option<PeerConnection> {
        let pos = self
            .peers
            .iter()
            .position(|p| &p.participant_id() == participant_id)?;
        let conn = self.peers.remove(pos);
        self.publish();
        Some(conn)
    }

    pub(crate) fn drain(&mut self) -> Vec<PeerConnection> {
        let drained = std::mem::take(&mut self.peers);
        self.publish();
        drained
    }

    /// Push the current list to subscribers after an in-place state change.
    pub(crate) fn publish(&self) {
        self.watch_tx.send_replace(self.summaries());
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
