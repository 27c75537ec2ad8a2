pub use meshroom_core::model::{ParticipantId, RoomId};

pub mod model {
    pub use meshroom_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshroom_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshroom_client::*;
}
