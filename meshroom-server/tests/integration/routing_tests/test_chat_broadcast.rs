use meshroom_core::{MessageId, RelayEvent};
use meshroom_server::RoomCommand;

use crate::integration::{create_test_manager, init_tracing, join};

#[test]
fn test_chat_reaches_whole_room_with_same_message_id() {
    init_tracing();
    let (manager, signaling) = create_test_manager();

    let a = join(&manager, "R1", "a");
    let b = join(&manager, "R1", "b");
    let c = join(&manager, "R1", "c");
    let outsider = join(&manager, "R2", "d");
    signaling.clear();

    let message_id = MessageId::new();
    manager.handle(
        b,
        RoomCommand::Chat {
            text: "hi".into(),
            message_id,
        },
    );

    for member in [a, b, c] {
        let events = signaling.events_for(&member);
        let [RelayEvent::ChatMessageBroadcast(message)] = events.as_slice() else {
            panic!("expected one broadcast for {member}");
        };
        assert_eq!(message.message_id, message_id);
        assert_eq!(message.text, "hi");
        assert_eq!(message.sender.participant_id, b);
    }
    assert!(signaling.events_for(&outsider).is_empty());
}
