pub mod routing_tests;

use std::sync::Arc;

use meshroom_core::{Participant, ParticipantId, RoomId};
use meshroom_server::{RoomCommand, RoomManager};
use tracing::Level;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_manager() -> (RoomManager, MockSignalingOutput) {
    let signaling = MockSignalingOutput::new();
    let manager = RoomManager::new(Arc::new(signaling.clone()));
    (manager, signaling)
}

pub fn join(manager: &RoomManager, room: &str, name: &str) -> ParticipantId {
    let id = ParticipantId::new();
    manager.handle(
        id,
        RoomCommand::Join {
            room_id: RoomId::from(room),
            participant: Participant::named(name),
        },
    );
    id
}
