use meshroom_core::{ParticipantId, RelayEvent};

/// Delivery seam between room bookkeeping and the connected sockets.
///
/// Implementations must enqueue without blocking: rooms call this while holding
/// their membership lock, which is what keeps per-client delivery order
/// consistent with membership changes.
pub trait SignalingOutput: Send + Sync {
    fn deliver(&self, to: ParticipantId, event: RelayEvent);
}
