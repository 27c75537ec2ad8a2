use meshroom_client::{SessionError, SessionState};
use meshroom_core::{Participant, RoomId};

use crate::integration::Harness;

#[tokio::test]
async fn join_without_participant_is_refused() {
    let mut h = Harness::new();

    let err = h
        .session
        .join(RoomId::from("r1"), None)
        .await
        .expect_err("anonymous join must fail");

    assert!(matches!(err, SessionError::IdentityMissing));
    assert_eq!(h.session.state(), SessionState::Idle);
    assert_eq!(h.relay.connects(), 0);
    assert!(h.relay.sent().is_empty());
}

#[tokio::test]
async fn blank_participant_counts_as_missing() {
    let mut h = Harness::new();

    let err = h
        .session
        .join(RoomId::from("r1"), Some(Participant::named("   ")))
        .await
        .expect_err("blank identity must fail");

    assert!(matches!(err, SessionError::IdentityMissing));
    assert!(h.relay.sent().is_empty());

    // The session is still usable afterwards.
    h.session
        .join(RoomId::from("r1"), Some(Participant::named("ada")))
        .await
        .expect("join");
    assert_eq!(h.session.state(), SessionState::Joining);
}

#[tokio::test]
async fn unreachable_relay_closes_session() {
    let mut h = Harness::new();
    h.relay.refuse_connect();

    let err = h
        .session
        .join(RoomId::from("r1"), Some(Participant::named("ada")))
        .await
        .expect_err("connect refused");

    assert!(matches!(err, SessionError::ChannelDisconnected(_)));
    assert_eq!(h.session.state(), SessionState::Closed);
}

#[tokio::test]
async fn second_join_is_invalid() {
    let mut h = Harness::new();
    h.join_with("r1", &[]).await;

    let err = h
        .session
        .join(RoomId::from("r2"), Some(Participant::named("ada")))
        .await
        .expect_err("already joined");

    assert!(matches!(err, SessionError::InvalidState(SessionState::Active)));
}
