use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::session::SessionState;

/// Requests from outside the session's event loop.
#[derive(Debug)]
pub enum SessionCommand {
    Leave,
    SendChat(String),
    SetAudioEnabled(bool),
    SetVideoEnabled(bool),
}

/// Cloneable sender of [`SessionCommand`]s. Dropping every handle makes the
/// session leave its room.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    pub async fn leave(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::SendChat(text.into())).await
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetAudioEnabled(enabled)).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetVideoEnabled(enabled)).await
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::InvalidState(SessionState::Closed))
    }
}
