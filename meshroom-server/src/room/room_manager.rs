use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meshroom_core::{
    ChatMessage, Member, MessageId, Participant, ParticipantId, RelayEvent, RoomId, SignalPayload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Room membership and routing for every connected participant.
///
/// All deliveries that depend on membership happen while the room's map entry
/// is locked, so a joiner's `membership-snapshot` is always queued before any
/// arrival or departure that follows it.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ParticipantId, RoomId>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            signaling,
        }
    }

    pub fn handle(&self, from: ParticipantId, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                room_id,
                participant,
            } => self.join(from, room_id, participant),
            RoomCommand::Offer { target, signal } => self.route_offer(from, target, signal),
            RoomCommand::Answer { caller, signal } => self.route_answer(from, caller, signal),
            RoomCommand::Chat { text, message_id } => self.broadcast_chat(from, text, message_id),
            RoomCommand::Disconnect => self.disconnect(from),
        }
    }

    pub fn room_of(&self, participant_id: &ParticipantId) -> Option<RoomId> {
        self.memberships.get(participant_id).map(|r| r.clone())
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<Member> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn join(&self, from: ParticipantId, room_id: RoomId, participant: Participant) {
        match self.memberships.entry(from) {
            Entry::Occupied(existing) => {
                warn!(
                    "Participant {} already joined room '{}', ignoring join of '{}'",
                    from,
                    existing.get(),
                    room_id
                );
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(room_id.clone());
            }
        }

        let mut room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                Room::new(room_id.clone())
            });

        let existing = room.admit(Member::new(from, participant));
        info!(
            "Participant {} joined room '{}' ({} already present)",
            from,
            room.id(),
            existing.len()
        );
        self.signaling
            .deliver(from, RelayEvent::MembershipSnapshot(existing));
    }

    fn route_offer(&self, from: ParticipantId, target: ParticipantId, signal: SignalPayload) {
        let Some(room_id) = self.room_of(&from) else {
            warn!("Offer from {} before joining a room", from);
            return;
        };
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        let caller = match room.member(&from) {
            Some(caller) if target != from && room.contains(&target) => caller.clone(),
            _ => {
                warn!(
                    "Dropping offer from {} to {}: not in room '{}'",
                    from, target, room_id
                );
                return;
            }
        };

        debug!("Routing offer {} -> {}", from, target);
        self.signaling.deliver(
            target,
            RelayEvent::PeerArrived { signal, caller },
        );
    }

    fn route_answer(&self, from: ParticipantId, caller: ParticipantId, signal: SignalPayload) {
        let Some(room_id) = self.room_of(&from) else {
            warn!("Answer from {} before joining a room", from);
            return;
        };
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        if !room.contains(&from) || !room.contains(&caller) {
            warn!(
                "Dropping answer from {} to {}: not in room '{}'",
                from, caller, room_id
            );
            return;
        }

        debug!("Routing answer {} -> {}", from, caller);
        self.signaling.deliver(
            caller,
            RelayEvent::PeerAnswered {
                participant_id: from,
                signal,
            },
        );
    }

    fn broadcast_chat(&self, from: ParticipantId, text: String, message_id: MessageId) {
        let Some(room_id) = self.room_of(&from) else {
            warn!("Chat from {} before joining a room", from);
            return;
        };
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        let Some(sender) = room.member(&from) else {
            return;
        };

        let message = ChatMessage {
            sender: sender.clone(),
            text,
            message_id,
        };
        for member in room.members() {
            self.signaling.deliver(
                member.participant_id,
                RelayEvent::ChatMessageBroadcast(message.clone()),
            );
        }
    }

    fn disconnect(&self, from: ParticipantId) {
        let Some((_, room_id)) = self.memberships.remove(&from) else {
            debug!("Participant {} left without joining a room", from);
            return;
        };

        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            if room.remove(&from).is_some() {
                info!("Participant {} left room '{}'", from, room_id);
                for member in room.members() {
                    self.signaling
                        .deliver(member.participant_id, RelayEvent::PeerDeparted(from));
                }
            }
        }

        if self
            .rooms
            .remove_if(&room_id, |_, room| room.is_empty())
            .is_some()
        {
            info!("Room '{}' is empty, removed", room_id);
        }
    }
}
