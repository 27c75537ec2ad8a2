use meshroom_core::{RelayEvent, RoomId};
use meshroom_server::RoomCommand;

use crate::integration::{create_test_manager, init_tracing, join};

#[test]
fn test_departure_reaches_every_remaining_member() {
    init_tracing();
    let (manager, signaling) = create_test_manager();

    let a = join(&manager, "R1", "a");
    let b = join(&manager, "R1", "b");
    let c = join(&manager, "R1", "c");
    signaling.clear();

    manager.handle(b, RoomCommand::Disconnect);

    assert_eq!(signaling.events_for(&a), vec![RelayEvent::PeerDeparted(b)]);
    assert_eq!(signaling.events_for(&c), vec![RelayEvent::PeerDeparted(b)]);
    assert!(signaling.events_for(&b).is_empty());
    assert_eq!(manager.members(&RoomId::from("R1")).len(), 2);
}

#[test]
fn test_last_member_leaving_removes_room() {
    init_tracing();
    let (manager, signaling) = create_test_manager();

    let a = join(&manager, "R1", "a");
    manager.handle(a, RoomCommand::Disconnect);

    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.room_of(&a), None);
    assert_eq!(signaling.total(), 1);
}

#[test]
fn test_disconnect_without_join_is_noop() {
    init_tracing();
    let (manager, signaling) = create_test_manager();

    let a = join(&manager, "R1", "a");
    signaling.clear();
    manager.handle(meshroom_core::ParticipantId::new(), RoomCommand::Disconnect);

    assert_eq!(signaling.total(), 0);
    assert_eq!(manager.room_of(&a), Some(RoomId::from("R1")));
}
