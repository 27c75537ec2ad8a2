use meshroom_client::{NegotiationState, PeerRole, SessionEvent, SessionState};
use meshroom_core::{ClientEvent, RelayEvent};

use crate::integration::{Harness, member};
use crate::utils::{fake_answer, fake_offer};

fn stream_events(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::StreamReceived { .. }))
        .count()
}

#[tokio::test]
async fn arrival_creates_responder_that_answers_the_caller() {
    let mut h = Harness::new();
    h.join_with("r1", &[]).await;
    h.relay.take_sent();

    let newcomer = member("newcomer");
    h.relay.push(RelayEvent::PeerArrived {
        signal: fake_offer(newcomer.participant_id),
        caller: newcomer.clone(),
    });
    h.settle().await;

    let conn = h
        .session
        .registry()
        .find(&newcomer.participant_id)
        .expect("responder registered");
    assert_eq!(conn.role(), PeerRole::Responder);
    assert_eq!(conn.state(), NegotiationState::Connected);
    assert_eq!(h.agents.applied(newcomer.participant_id), 1);

    let sent = h.relay.sent();
    assert_eq!(sent.len(), 1);
    let ClientEvent::SendAnswer { caller, .. } = &sent[0] else {
        panic!("expected send-answer, got {:?}", sent[0]);
    };
    assert_eq!(caller.participant_id, newcomer.participant_id);
}

#[tokio::test]
async fn answer_completes_initiator_and_reports_stream_once() {
    let mut h = Harness::new();
    let existing = member("existing");
    h.join_with("r1", &[existing.clone()]).await;
    h.drain_events();

    h.relay.push(RelayEvent::PeerAnswered {
        participant_id: existing.participant_id,
        signal: fake_answer(existing.participant_id),
    });
    h.settle().await;

    let conn = h.session.registry().find(&existing.participant_id).unwrap();
    assert_eq!(conn.state(), NegotiationState::Connected);
    assert!(conn.remote_stream().is_some());

    let events = h.drain_events();
    assert_eq!(stream_events(&events), 1);
    let Some(SessionEvent::StreamReceived { peer, .. }) = events
        .iter()
        .find(|e| matches!(e, SessionEvent::StreamReceived { .. }))
    else {
        unreachable!();
    };
    assert_eq!(peer.participant_id, existing.participant_id);
}

#[tokio::test]
async fn replayed_answer_is_applied_once() {
    let mut h = Harness::new();
    let existing = member("existing");
    h.join_with("r1", &[existing.clone()]).await;

    for _ in 0..3 {
        h.relay.push(RelayEvent::PeerAnswered {
            participant_id: existing.participant_id,
            signal: fake_answer(existing.participant_id),
        });
    }
    h.settle().await;

    assert_eq!(h.agents.applied(existing.participant_id), 1);
    assert_eq!(stream_events(&h.drain_events()), 1);
    assert_eq!(h.session.state(), SessionState::Active);
}

#[tokio::test]
async fn answer_for_unknown_peer_is_dropped() {
    let mut h = Harness::new();
    let existing = member("existing");
    h.join_with("r1", &[existing.clone()]).await;

    let stranger = member("stranger");
    h.relay.push(RelayEvent::PeerAnswered {
        participant_id: stranger.participant_id,
        signal: fake_answer(stranger.participant_id),
    });
    h.settle().await;

    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.session.registry().ids(), vec![existing.participant_id]);
    assert!(h.agents.role_of(stranger.participant_id).is_none());
}

#[tokio::test]
async fn answer_after_departure_is_dropped() {
    let mut h = Harness::new();
    let existing = member("existing");
    h.join_with("r1", &[existing.clone()]).await;

    h.relay.push(RelayEvent::PeerDeparted(existing.participant_id));
    h.relay.push(RelayEvent::PeerAnswered {
        participant_id: existing.participant_id,
        signal: fake_answer(existing.participant_id),
    });
    h.settle().await;

    assert!(h.session.registry().is_empty());
    assert_eq!(h.agents.applied(existing.participant_id), 0);
    assert_eq!(h.agents.closed(existing.participant_id), 1);
}

#[tokio::test]
async fn duplicate_arrival_keeps_existing_connection() {
    let mut h = Harness::new();
    let existing = member("existing");
    h.join_with("r1", &[existing.clone()]).await;

    h.relay.push(RelayEvent::PeerArrived {
        signal: fake_offer(existing.participant_id),
        caller: existing.clone(),
    });
    h.settle().await;

    assert_eq!(h.session.registry().len(), 1);
    let conn = h.session.registry().find(&existing.participant_id).unwrap();
    assert_eq!(conn.role(), PeerRole::Initiator);
    assert_eq!(h.agents.built().len(), 1);
}

#[tokio::test]
async fn three_way_mesh_roles() {
    // Joining a room of two, then a third member arrives.
    let mut h = Harness::new();
    let a = member("a");
    let b = member("b");
    h.join_with("r1", &[a.clone(), b.clone()]).await;

    let c = member("c");
    h.relay.push(RelayEvent::PeerArrived {
        signal: fake_offer(c.participant_id),
        caller: c.clone(),
    });
    h.settle().await;

    let roles: Vec<_> = h
        .session
        .registry()
        .iter()
        .map(|conn| (conn.participant_id(), conn.role()))
        .collect();
    assert_eq!(
        roles,
        vec![
            (a.participant_id, PeerRole::Initiator),
            (b.participant_id, PeerRole::Initiator),
            (c.participant_id, PeerRole::Responder),
        ]
    );
}
