use meshroom_core::{ClientEvent, MessageId, Participant, ParticipantId, RoomId, SignalPayload};

/// A client frame reduced to what the relay acts on. The sender's identity is
/// never taken from the frame; the connection it arrived on supplies it.
#[derive(Debug)]
pub enum RoomCommand {
    /// Announce presence in a room.
    Join {
        room_id: RoomId,
        participant: Participant,
    },

    /// Forward an initiator's offer to `target`.
    Offer {
        target: ParticipantId,
        signal: SignalPayload,
    },

    /// Return a responder's answer to the member that sent the offer.
    Answer {
        caller: ParticipantId,
        signal: SignalPayload,
    },

    Chat {
        text: String,
        message_id: MessageId,
    },

    /// The WebSocket closed.
    Disconnect,
}

impl From<ClientEvent> for RoomCommand {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinRoom {
                room_id,
                participant,
            } => RoomCommand::Join {
                room_id,
                participant,
            },
            ClientEvent::SendOffer {
                target_participant_id,
                signal,
                ..
            } => RoomCommand::Offer {
                target: target_participant_id,
                signal,
            },
            ClientEvent::SendAnswer { signal, caller } => RoomCommand::Answer {
                caller: caller.participant_id,
                signal,
            },
            ClientEvent::ChatMessage(message) => RoomCommand::Chat {
                text: message.text,
                message_id: message.message_id,
            },
        }
    }
}
