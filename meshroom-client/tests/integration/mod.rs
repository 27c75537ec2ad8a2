pub mod join_tests;
pub mod negotiation_tests;

use meshroom_client::{LocalMedia, RoomSession, SessionEvent, SessionHandle, SessionState};
use meshroom_core::{IceServerConfig, Member, Participant, ParticipantId, RelayEvent, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{FakeAgents, MockRelay, mock_channel, settle};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn member(name: &str) -> Member {
    Member::new(ParticipantId::new(), Participant::named(name))
}

/// A session wired to a mock relay and fake agents.
pub struct Harness {
    pub session: RoomSession,
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub relay: MockRelay,
    pub agents: FakeAgents,
    pub media: Arc<LocalMedia>,
    pub local_id: ParticipantId,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let (relay, channel) = mock_channel();
        let agents = FakeAgents::new();
        let media = Arc::new(LocalMedia::camera_and_microphone());
        let (session, handle, events) = RoomSession::new(
            Box::new(channel),
            agents.builder(),
            media.clone(),
            IceServerConfig::default_stun(),
        );
        Self {
            session,
            handle,
            events,
            relay,
            agents,
            media,
            local_id: ParticipantId::new(),
        }
    }

    /// Join `room` and let the relay welcome us. Stops short of the snapshot.
    pub async fn join(&mut self, room: &str) {
        self.session
            .join(RoomId::from(room), Some(Participant::named("local")))
            .await
            .expect("join");
        self.relay.push(RelayEvent::Welcome {
            participant_id: self.local_id,
        });
        self.settle().await;
    }

    /// Join and receive a snapshot listing `existing`.
    pub async fn join_with(&mut self, room: &str, existing: &[Member]) {
        self.join(room).await;
        self.relay
            .push(RelayEvent::MembershipSnapshot(existing.to_vec()));
        self.settle().await;
        assert_eq!(self.session.state(), SessionState::Active);
    }

    pub async fn settle(&mut self) {
        settle(&mut self.session).await;
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
