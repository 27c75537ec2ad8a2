use meshroom_core::{ChatMessage, Member};

use crate::error::SessionError;
use crate::peer::RemoteStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Joining,
    Active,
    Leaving,
    Closed,
}

impl SessionState {
    /// Whether relay events are being consumed.
    pub fn is_listening(self) -> bool {
        matches!(self, SessionState::Joining | SessionState::Active)
    }
}

/// What the session pushes to its observers (UI, CLI).
#[derive(Debug)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// A peer's media arrived. Fired once per connection.
    StreamReceived { peer: Member, stream: RemoteStream },
    Chat(ChatMessage),
    /// A session-ending failure.
    Error(SessionError),
}
