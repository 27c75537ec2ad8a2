use meshroom_core::{
    ChatMessage, ClientEvent, IceServerConfig, Member, MessageId, Participant, ParticipantId,
    RelayEvent, RoomId, SignalKind, SignalPayload,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channel::{SignalingChannel, WsChannel};
use crate::config::SessionConfig;
use crate::error::{ChannelError, RegistryError, SessionError};
use crate::media::{LocalMedia, TrackKind};
use crate::peer::{
    AgentBuilder, PeerConnection, PeerConnectionFactory, PeerEvent, PeerEventKind, PeerRegistry,
    PeerSummary,
};
use crate::session::{SessionCommand, SessionEvent, SessionHandle, SessionState};

/// One client's presence in one room.
///
/// An actor: every relay event, agent callback and command is handled as a
/// separate turn of [`step`](RoomSession::step), so the registry and session
/// state are consistent between turns. The session exclusively owns its
/// signaling channel and is the only writer of its [`PeerRegistry`].
pub struct RoomSession {
    state: SessionState,
    channel: Box<dyn SignalingChannel>,
    registry: PeerRegistry,
    factory: PeerConnectionFactory,
    media: Arc<LocalMedia>,
    room_id: Option<RoomId>,
    local_id: Option<ParticipantId>,
    local_participant: Option<Participant>,
    command_rx: mpsc::Receiver<SessionCommand>,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl RoomSession {
    pub fn new(
        channel: Box<dyn SignalingChannel>,
        builder: Arc<dyn AgentBuilder>,
        media: Arc<LocalMedia>,
        ice_servers: Vec<IceServerConfig>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let session = Self {
            state: SessionState::Idle,
            channel,
            registry: PeerRegistry::new(),
            factory: PeerConnectionFactory::new(builder, peer_tx, ice_servers),
            media,
            room_id: None,
            local_id: None,
            local_participant: None,
            command_rx,
            peer_rx,
            events_tx,
        };
        (session, SessionHandle::new(command_tx), events_rx)
    }

    /// A session talking to the relay at `config.relay_url` over WebSocket.
    pub fn with_config(
        config: &SessionConfig,
        builder: Arc<dyn AgentBuilder>,
        media: Arc<LocalMedia>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        Self::new(
            Box::new(WsChannel::new(config.relay_url.clone())),
            builder,
            media,
            config.ice_servers.clone(),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Ordered peer list for rendering; refreshed on every registry change.
    pub fn peers(&self) -> watch::Receiver<Vec<PeerSummary>> {
        self.registry.subscribe()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Relay-issued id of this client, known after `welcome`.
    pub fn local_id(&self) -> Option<ParticipantId> {
        self.local_id
    }

    pub fn media(&self) -> &Arc<LocalMedia> {
        &self.media
    }

    /// Announce presence in `room_id`. Refused without a signed-in participant,
    /// in which case nothing is sent and the session stays `Idle`.
    pub async fn join(
        &mut self,
        room_id: RoomId,
        participant: Option<Participant>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(self.state));
        }
        let participant = participant
            .filter(|p| !p.is_empty())
            .ok_or(SessionError::IdentityMissing)?;

        self.set_state(SessionState::Joining);
        if let Err(e) = self.channel.connect().await {
            self.close(None).await;
            return Err(SessionError::ChannelDisconnected(e));
        }

        let join = ClientEvent::JoinRoom {
            room_id: room_id.clone(),
            participant: participant.clone(),
        };
        if let Err(e) = self.channel.send(join).await {
            self.close(None).await;
            return Err(SessionError::ChannelDisconnected(e));
        }

        info!("Joining room '{}' as '{}'", room_id, participant.display_name);
        self.room_id = Some(room_id);
        self.local_participant = Some(participant);
        Ok(())
    }

    /// Disconnect and destroy every peer connection.
    pub async fn leave(&mut self) {
        self.close(None).await;
    }

    pub async fn send_chat(&mut self, text: impl Into<String>) -> Result<MessageId, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::InvalidState(self.state));
        }
        let message = ChatMessage {
            sender: self.local_member(),
            text: text.into(),
            message_id: MessageId::new(),
        };
        let message_id = message.message_id;
        self.channel
            .send(ClientEvent::ChatMessage(message))
            .await
            .map_err(SessionError::ChannelDisconnected)?;
        Ok(message_id)
    }

    /// Session-wide camera/microphone toggle.
    pub fn set_media_enabled(&self, kind: TrackKind, enabled: bool) {
        info!("Local {:?} {}", kind, if enabled { "on" } else { "off" });
        self.media.set_enabled(kind, enabled);
    }

    /// Process until the session is closed.
    pub async fn run(mut self) {
        info!("Room session event loop started");
        while self.step().await {}
        info!("Room session event loop finished");
    }

    /// Handle one event. Returns `false` once the session is closed.
    pub async fn step(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        let listening = self.state.is_listening();

        tokio::select! {
            biased;

            cmd = self.command_rx.recv() => match cmd {
                Some(c) => self.handle_command(c).await,
                None => {
                    info!("All session handles dropped. Leaving.");
                    self.close(None).await;
                }
            },

            evt = self.channel.recv(), if listening => match evt {
                Some(e) => {
                    let res = self.handle_relay_event(e).await;
                    self.absorb(res).await;
                }
                None => {
                    let err = SessionError::ChannelDisconnected(ChannelError::Closed);
                    self.close(Some(err)).await;
                }
            },

            Some(evt) = self.peer_rx.recv() => {
                let res = self.handle_peer_event(evt).await;
                self.absorb(res).await;
            }
        }

        self.state != SessionState::Closed
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Leave => self.close(None).await,
            SessionCommand::SendChat(text) => {
                let res = self.send_chat(text).await.map(|_| ());
                self.absorb(res).await;
            }
            SessionCommand::SetAudioEnabled(enabled) => {
                self.set_media_enabled(TrackKind::Audio, enabled)
            }
            SessionCommand::SetVideoEnabled(enabled) => {
                self.set_media_enabled(TrackKind::Video, enabled)
            }
        }
    }

    async fn handle_relay_event(&mut self, event: RelayEvent) -> Result<(), SessionError> {
        debug!("Relay event '{}' in state {:?}", event.name(), self.state);
        match event {
            RelayEvent::Welcome { participant_id } => {
                info!("Relay assigned participant id {}", participant_id);
                self.local_id = Some(participant_id);
                Ok(())
            }
            RelayEvent::IceConfig { ice_servers } => {
                debug!("Received {} ICE servers from relay", ice_servers.len());
                self.factory.set_ice_servers(ice_servers);
                Ok(())
            }
            RelayEvent::MembershipSnapshot(members) => self.on_snapshot(members).await,
            RelayEvent::PeerArrived { signal, caller } => self.on_peer_arrived(signal, caller).await,
            RelayEvent::PeerAnswered {
                participant_id,
                signal,
            } => self.on_peer_answered(participant_id, signal).await,
            RelayEvent::PeerDeparted(participant_id) => {
                self.on_peer_departed(participant_id).await;
                Ok(())
            }
            RelayEvent::ChatMessageBroadcast(message) => {
                self.emit(SessionEvent::Chat(message));
                Ok(())
            }
        }
    }

    /// Initiate towards every member already present. Ids that are already
    /// registered (or ourselves) are skipped; a snapshot never removes peers.
    async fn on_snapshot(&mut self, members: Vec<Member>) -> Result<(), SessionError> {
        if self.state == SessionState::Joining {
            self.set_state(SessionState::Active);
        }
        info!("Membership snapshot: {} existing members", members.len());

        for member in members {
            let id = member.participant_id;
            if Some(id) == self.local_id || self.registry.contains(&id) {
                debug!("Snapshot member {} already known, skipping", id);
                continue;
            }
            match self.factory.create_initiator(member, &self.media).await {
                Ok(conn) => self.register(conn).await,
                Err(e) => warn!("Could not create initiator for {}: {:#}", id, e),
            }
        }
        Ok(())
    }

    async fn on_peer_arrived(
        &mut self,
        signal: SignalPayload,
        caller: Member,
    ) -> Result<(), SessionError> {
        let id = caller.participant_id;
        if Some(id) == self.local_id {
            return Ok(());
        }
        if self.registry.contains(&id) {
            debug!("Duplicate arrival for {}, keeping existing connection", id);
            return Ok(());
        }
        if self.state == SessionState::Joining {
            warn!("Arrival of {} before membership snapshot", id);
        }

        let conn = self
            .factory
            .create_responder(signal, caller, &self.media)
            .await
            .map_err(|e| SessionError::negotiation(id, format!("{e:#}")))?;
        self.register(conn).await;
        Ok(())
    }

    async fn on_peer_answered(
        &mut self,
        participant_id: ParticipantId,
        signal: SignalPayload,
    ) -> Result<(), SessionError> {
        let conn = self
            .registry
            .find_mut(&participant_id)
            .ok_or(SessionError::UnknownPeerReference(participant_id))?;

        match conn.apply_answer(signal).await {
            Ok(true) => {
                self.registry.publish();
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => Err(SessionError::negotiation(participant_id, format!("{e:#}"))),
        }
    }

    async fn on_peer_departed(&mut self, participant_id: ParticipantId) {
        match self.registry.remove(&participant_id) {
            Some(mut conn) => {
                conn.destroy().await;
                info!("Peer {} left, connection destroyed", participant_id);
            }
            None => debug!("Departure of unknown peer {}, ignoring", participant_id),
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) -> Result<(), SessionError> {
        let PeerEvent {
            participant_id,
            serial,
            kind,
        } = event;

        let Some(conn) = self
            .registry
            .find_mut(&participant_id)
            .filter(|c| c.serial() == serial)
        else {
            return Err(SessionError::UnknownPeerReference(participant_id));
        };

        match kind {
            PeerEventKind::Signal(envelope) => {
                conn.record_local_signal();
                let remote = conn.remote().clone();
                self.registry.publish();

                let event = match envelope.kind {
                    SignalKind::OfferBundle => ClientEvent::SendOffer {
                        target_participant_id: envelope.target,
                        caller: self.local_member(),
                        signal: envelope.payload,
                    },
                    SignalKind::AnswerBundle => ClientEvent::SendAnswer {
                        signal: envelope.payload,
                        caller: remote,
                    },
                };
                debug!("Forwarding {:?} to {}", envelope.kind, envelope.target);
                self.channel
                    .send(event)
                    .await
                    .map_err(SessionError::ChannelDisconnected)
            }
            PeerEventKind::Stream(stream) => {
                if conn.record_stream(stream.clone()) {
                    let peer = conn.remote().clone();
                    self.registry.publish();
                    info!("Stream received from {}", participant_id);
                    self.emit(SessionEvent::StreamReceived { peer, stream });
                }
                Ok(())
            }
            PeerEventKind::Failed(reason) => Err(SessionError::NegotiationFailure {
                participant_id,
                reason,
            }),
        }
    }

    /// Apply the propagation policy to a handler's outcome.
    async fn absorb(&mut self, result: Result<(), SessionError>) {
        let Err(err) = result else {
            return;
        };
        match err {
            SessionError::UnknownPeerReference(id) => {
                debug!("Dropping stale message for {}", id);
            }
            SessionError::NegotiationFailure {
                participant_id,
                reason,
            } => {
                warn!("Negotiation with {} failed: {}", participant_id, reason);
                if let Some(mut conn) = self.registry.remove(&participant_id) {
                    conn.destroy().await;
                }
            }
            err if err.is_fatal() => self.close(Some(err)).await,
            err => warn!("{}", err),
        }
    }

    async fn register(&mut self, conn: PeerConnection) {
        if let Err(RegistryError::Duplicate(mut rejected)) = self.registry.add(conn) {
            warn!(
                "Refusing second connection for {}",
                rejected.participant_id()
            );
            rejected.destroy().await;
        }
    }

    /// All-or-nothing teardown. `reason` is reported to observers when set.
    async fn close(&mut self, reason: Option<SessionError>) {
        if self.state == SessionState::Closed {
            return;
        }
        self.set_state(SessionState::Leaving);
        self.channel.disconnect().await;

        let peers = self.registry.drain();
        let count = peers.len();
        for mut conn in peers {
            conn.destroy().await;
        }
        info!("Session closed, destroyed {} peer connections", count);

        if let Some(err) = reason {
            error!("Session terminated: {}", err);
            self.emit(SessionEvent::Error(err));
        }
        self.set_state(SessionState::Closed);
    }

    fn local_member(&self) -> Member {
        // The relay stamps the real connection id on everything it forwards.
        Member::new(
            self.local_id.unwrap_or(ParticipantId(Uuid::nil())),
            self.local_participant.clone().unwrap_or_default(),
        )
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!("Session state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let peers = self.registry.drain();
        warn!(
            "RoomSession dropped with {} live peer connections, destroying",
            peers.len()
        );
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                for mut conn in peers {
                    conn.destroy().await;
                }
            });
        }
    }
}
