mod chat;
mod participant;
mod protocol;
mod room;
mod signaling;

pub use chat::{ChatMessage, MessageId};
pub use participant::{IdParseError, Member, Participant, ParticipantId};
pub use protocol::{ClientEvent, RelayEvent};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalEnvelope, SignalKind, SignalPayload};
