use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use dashmap::DashMap;
use meshroom_core::{IceServerConfig, ParticipantId, RelayEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Registry of live relay connections and their outbound queues.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_peer(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(participant_id, tx);
    }

    pub fn remove_peer(&self, participant_id: &ParticipantId) {
        self.inner.peers.remove(participant_id);
    }

    pub fn connected_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn send_signal(&self, participant_id: ParticipantId, event: RelayEvent) {
        let Some(peer) = self.inner.peers.get(&participant_id) else {
            warn!(
                "Attempted to send '{}' to disconnected participant {}",
                event.name(),
                participant_id
            );
            return;
        };

        match serde_json::to_string(&event) {
            Ok(json) => {
                debug!("-> {} '{}'", participant_id, event.name());
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to queue WS message to {}: {:?}", participant_id, e);
                }
            }
            Err(e) => error!("Failed to serialize relay event: {}", e),
        }
    }
}

impl SignalingOutput for SignalingService {
    fn deliver(&self, to: ParticipantId, event: RelayEvent) {
        self.send_signal(to, event);
    }
}
