mod room_session;
mod session_command;
mod session_event;

pub use room_session::*;
pub use session_command::*;
pub use session_event::*;
