pub mod mock_signaling;

pub use mock_signaling::*;
pub use ws_client::*;
