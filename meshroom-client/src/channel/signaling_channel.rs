use async_trait::async_trait;
use meshroom_core::{ClientEvent, RelayEvent};

use crate::error::ChannelError;

/// Ordered, bidirectional link to the relay.
///
/// Inbound events are pulled with [`recv`](SignalingChannel::recv) and matched
/// by the owning session, so handlers never run concurrently with each other.
#[async_trait]
pub trait SignalingChannel: Send {
    /// Establish the link. A no-op while already connected.
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Queue `event` for the relay. Sends on one channel are delivered in order.
    async fn send(&mut self, event: ClientEvent) -> Result<(), ChannelError>;

    /// Next relay event, or `None` once the channel is gone. Must be cancel safe.
    async fn recv(&mut self) -> Option<RelayEvent>;

    /// Close the link. Nothing is received afterwards.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}
