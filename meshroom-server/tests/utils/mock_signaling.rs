use meshroom_core::{ParticipantId, RelayEvent};
use meshroom_server::SignalingOutput;
use std::sync::{Arc, Mutex};

/// SignalingOutput that records every delivery instead of writing to a socket.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    delivered: Arc<Mutex<Vec<(ParticipantId, RelayEvent)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered to `participant_id`, in delivery order.
    pub fn events_for(&self, participant_id: &ParticipantId) -> Vec<RelayEvent> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == participant_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.delivered.lock().unwrap().clear();
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn deliver(&self, to: ParticipantId, event: RelayEvent) {
        tracing::debug!("[MockSignaling] {} to {}", event.name(), to);
        self.delivered.lock().unwrap().push((to, event));
    }
}
