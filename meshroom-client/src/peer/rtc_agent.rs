use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use meshroom_core::{IceServerConfig, SignalPayload};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::media::{LocalMedia, LocalTrack, TrackKind};
use crate::peer::{AgentBuilder, AgentEmitter, AgentSpec, NegotiationAgent, PeerRole, RemoteStream};

/// Builds [`RtcAgent`]s that share one set of local sample tracks, so a single
/// capture is fanned out to every peer connection.
#[derive(Default)]
pub struct RtcAgentBuilder {
    tracks: Mutex<HashMap<String, Arc<TrackLocalStaticSample>>>,
}

impl RtcAgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared sample track for `track`, created on first use. Capture code
    /// writes samples here while [`LocalTrack::is_live`] holds.
    pub fn sample_track(&self, media: &LocalMedia, track: &LocalTrack) -> Arc<TrackLocalStaticSample> {
        let mut tracks = self
            .tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracks
            .entry(track.id().to_owned())
            .or_insert_with(|| {
                let mime_type = match track.kind() {
                    TrackKind::Audio => MIME_TYPE_OPUS,
                    TrackKind::Video => MIME_TYPE_VP8,
                };
                Arc::new(TrackLocalStaticSample::new(
                    RTCRtpCodecCapability {
                        mime_type: mime_type.to_owned(),
                        ..Default::default()
                    },
                    track.id().to_owned(),
                    media.stream_id().to_owned(),
                ))
            })
            .clone()
    }
}

#[async_trait]
impl AgentBuilder for RtcAgentBuilder {
    async fn build(
        &self,
        spec: AgentSpec,
        emitter: AgentEmitter,
    ) -> Result<Box<dyn NegotiationAgent>> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: spec.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };
        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in spec.media.tracks() {
            let sample_track = self.sample_track(&spec.media, track);
            pc.add_track(sample_track as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .context("failed to add local track")?;
        }
        for (kind, codec_type) in [
            (TrackKind::Audio, RTPCodecType::Audio),
            (TrackKind::Video, RTPCodecType::Video),
        ] {
            if !spec.media.has(kind) {
                pc.add_transceiver_from_kind(
                    codec_type,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
            }
        }

        let state_emitter = emitter.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let emitter = state_emitter.clone();
            Box::pin(async move {
                info!(
                    "Peer connection state for {}: {:?}",
                    emitter.participant_id(),
                    s
                );
                if s == RTCPeerConnectionState::Failed {
                    emitter.failed("peer connection failed");
                }
            })
        }));

        let track_emitter = emitter.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let emitter = track_emitter.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                debug!("Remote {:?} track from {}", kind, emitter.participant_id());
                emitter.remote_stream(RemoteStream {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind,
                });
            })
        }));

        let agent = RtcAgent {
            role: spec.role,
            pc,
            emitter,
        };
        if agent.role == PeerRole::Initiator {
            agent.spawn_local_description(RTCSdpType::Offer);
        }
        Ok(Box::new(agent))
    }
}

/// [`NegotiationAgent`] backed by one `RTCPeerConnection`. Trickle ICE is off:
/// each side sends one description after gathering completes.
pub struct RtcAgent {
    role: PeerRole,
    pc: Arc<RTCPeerConnection>,
    emitter: AgentEmitter,
}

impl RtcAgent {
    fn spawn_local_description(&self, sdp_type: RTCSdpType) {
        let pc = Arc::clone(&self.pc);
        let emitter = self.emitter.clone();
        tokio::spawn(async move {
            match gathered_local_description(&pc, sdp_type).await {
                Ok(payload) => emitter.local_signal(payload),
                Err(e) => emitter.failed(format!("{e:#}")),
            }
        });
    }
}

#[async_trait]
impl NegotiationAgent for RtcAgent {
    async fn apply_remote_signal(&self, payload: SignalPayload) -> Result<()> {
        let desc: RTCSessionDescription = serde_json::from_value(payload.into_inner())
            .context("signal is not a session description")?;

        match (self.role, desc.sdp_type) {
            (PeerRole::Responder, RTCSdpType::Offer) => {
                self.pc.set_remote_description(desc).await?;
                self.spawn_local_description(RTCSdpType::Answer);
            }
            (PeerRole::Initiator, RTCSdpType::Answer) => {
                self.pc.set_remote_description(desc).await?;
            }
            (role, other) => bail!("{role:?} cannot apply a remote {other}"),
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

async fn gathered_local_description(
    pc: &RTCPeerConnection,
    sdp_type: RTCSdpType,
) -> Result<SignalPayload> {
    let desc = match sdp_type {
        RTCSdpType::Offer => pc.create_offer(None).await?,
        _ => pc.create_answer(None).await?,
    };

    let mut gathering_complete = pc.gathering_complete_promise().await;
    pc.set_local_description(desc).await?;
    // Resolves (with `None`) once gathering is complete.
    let _ = gathering_complete.recv().await;

    let local = pc
        .local_description()
        .await
        .context("no local description after ICE gathering")?;
    Ok(SignalPayload::new(serde_json::to_value(&local)?))
}

fn to_rtc_ice_server(config: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: config.urls.clone(),
        username: config.username.clone().unwrap_or_default(),
        credential: config.credential.clone().unwrap_or_default(),
    }
}
