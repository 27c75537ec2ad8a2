mod channel;
mod config;
mod error;
mod media;
mod peer;
mod session;

pub use channel::*;
pub use config::SessionConfig;
pub use error::{ChannelError, RegistryError, SessionError};
pub use media::{LocalMedia, LocalTrack, TrackKind};
pub use peer::*;
pub use session::*;
