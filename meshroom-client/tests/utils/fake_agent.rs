use anyhow::bail;
use async_trait::async_trait;
use meshroom_client::{
    AgentBuilder, AgentEmitter, AgentSpec, NegotiationAgent, PeerRole, RemoteStream, TrackKind,
};
use meshroom_core::{ParticipantId, SignalPayload};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Log {
    built: Vec<(ParticipantId, PeerRole)>,
    applied: HashMap<ParticipantId, usize>,
    closed: HashMap<ParticipantId, usize>,
    emitters: HashMap<ParticipantId, AgentEmitter>,
    fail_build: HashSet<ParticipantId>,
    fail_apply: HashSet<ParticipantId>,
}

/// Agent builder that negotiates instantly and records what happened.
///
/// An initiator emits its offer when built and its remote stream once the
/// answer is applied. A responder emits its answer and stream when the offer
/// is applied.
#[derive(Clone, Default)]
pub struct FakeAgents {
    log: Arc<Mutex<Log>>,
}

impl FakeAgents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder(&self) -> Arc<dyn AgentBuilder> {
        Arc::new(self.clone())
    }

    pub fn fail_build_for(&self, id: ParticipantId) {
        self.log.lock().unwrap().fail_build.insert(id);
    }

    pub fn fail_apply_for(&self, id: ParticipantId) {
        self.log.lock().unwrap().fail_apply.insert(id);
    }

    /// Report a transport failure from the agent for `id`.
    pub fn report_failure(&self, id: ParticipantId) {
        let emitter = self.log.lock().unwrap().emitters.get(&id).cloned();
        emitter.expect("no agent for participant").failed("ice failed");
    }

    pub fn built(&self) -> Vec<(ParticipantId, PeerRole)> {
        self.log.lock().unwrap().built.clone()
    }

    pub fn role_of(&self, id: ParticipantId) -> Option<PeerRole> {
        self.built()
            .into_iter()
            .rev()
            .find(|(built, _)| *built == id)
            .map(|(_, role)| role)
    }

    pub fn applied(&self, id: ParticipantId) -> usize {
        *self.log.lock().unwrap().applied.get(&id).unwrap_or(&0)
    }

    pub fn closed(&self, id: ParticipantId) -> usize {
        *self.log.lock().unwrap().closed.get(&id).unwrap_or(&0)
    }
}

pub fn fake_offer(from: ParticipantId) -> SignalPayload {
    SignalPayload::new(json!({ "type": "offer", "sdp": format!("offer-from-{from}") }))
}

pub fn fake_answer(from: ParticipantId) -> SignalPayload {
    SignalPayload::new(json!({ "type": "answer", "sdp": format!("answer-from-{from}") }))
}

fn fake_stream(id: ParticipantId) -> RemoteStream {
    RemoteStream {
        stream_id: format!("stream-{id}"),
        track_id: format!("track-{id}"),
        kind: TrackKind::Video,
    }
}

#[async_trait]
impl AgentBuilder for FakeAgents {
    async fn build(
        &self,
        spec: AgentSpec,
        emitter: AgentEmitter,
    ) -> anyhow::Result<Box<dyn NegotiationAgent>> {
        let id = spec.remote.participant_id;
        {
            let mut log = self.log.lock().unwrap();
            if log.fail_build.contains(&id) {
                bail!("agent construction refused");
            }
            log.built.push((id, spec.role));
            log.emitters.insert(id, emitter.clone());
        }

        if spec.role == PeerRole::Initiator {
            emitter.local_signal(fake_offer(id));
        }
        Ok(Box::new(FakeAgent {
            id,
            role: spec.role,
            emitter,
            log: self.log.clone(),
        }))
    }
}

struct FakeAgent {
    id: ParticipantId,
    role: PeerRole,
    emitter: AgentEmitter,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl NegotiationAgent for FakeAgent {
    async fn apply_remote_signal(&self, _payload: SignalPayload) -> anyhow::Result<()> {
        {
            let mut log = self.log.lock().unwrap();
            if log.fail_apply.contains(&self.id) {
                bail!("malformed session description");
            }
            *log.applied.entry(self.id).or_default() += 1;
        }

        if self.role == PeerRole::Responder {
            self.emitter.local_signal(fake_answer(self.id));
        }
        self.emitter.remote_stream(fake_stream(self.id));
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        *self.log.lock().unwrap().closed.entry(self.id).or_default() += 1;
        Ok(())
    }
}
