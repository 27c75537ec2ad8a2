use anyhow::Context;
use meshroom_core::{IceServerConfig, Member, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::media::LocalMedia;
use crate::peer::{
    AgentBuilder, AgentEmitter, AgentSpec, ConnectionSerial, PeerConnection, PeerEvent, PeerRole,
};

/// Builds peer connections in either role, wiring each agent's emissions to
/// the owning session's peer-event queue. It never registers what it builds.
pub struct PeerConnectionFactory {
    builder: Arc<dyn AgentBuilder>,
    events: mpsc::UnboundedSender<PeerEvent>,
    ice_servers: Vec<IceServerConfig>,
    next_serial: u64,
}

impl PeerConnectionFactory {
    pub fn new(
        builder: Arc<dyn AgentBuilder>,
        events: mpsc::UnboundedSender<PeerEvent>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            builder,
            events,
            ice_servers,
            next_serial: 1,
        }
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn set_ice_servers(&mut self, ice_servers: Vec<IceServerConfig>) {
        self.ice_servers = ice_servers;
    }

    /// A connection that immediately starts producing its offer for `remote`.
    pub async fn create_initiator(
        &mut self,
        remote: Member,
        media: &Arc<LocalMedia>,
    ) -> anyhow::Result<PeerConnection> {
        self.build(PeerRole::Initiator, remote, media).await
    }

    /// A connection that has already applied `offer` from `origin` when returned.
    pub async fn create_responder(
        &mut self,
        offer: SignalPayload,
        origin: Member,
        media: &Arc<LocalMedia>,
    ) -> anyhow::Result<PeerConnection> {
        let mut conn = self.build(PeerRole::Responder, origin, media).await?;
        if let Err(e) = conn.apply_offer(offer).await {
            conn.destroy().await;
            return Err(e.context(format!(
                "failed to apply offer from {}",
                conn.participant_id()
            )));
        }
        Ok(conn)
    }

    async fn build(
        &mut self,
        role: PeerRole,
        remote: Member,
        media: &Arc<LocalMedia>,
    ) -> anyhow::Result<PeerConnection> {
        let serial = ConnectionSerial(self.next_serial);
        self.next_serial += 1;

        let participant_id = remote.participant_id;
        let emitter = AgentEmitter::new(participant_id, serial, role, self.events.clone());
        let spec = AgentSpec {
            role,
            remote: remote.clone(),
            ice_servers: self.ice_servers.clone(),
            media: Arc::clone(media),
        };

        debug!("Building {:?} agent {} for {}", role, serial, participant_id);
        let agent = self
            .builder
            .build(spec, emitter)
            .await
            .with_context(|| format!("failed to build {role:?} agent for {participant_id}"))?;

        info!("Created {:?} connection {} for {}", role, serial, participant_id);
        Ok(PeerConnection::new(remote, role, serial, agent))
    }
}
