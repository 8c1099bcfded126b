use async_trait::async_trait;
use ferry_core::{PeerId, ServerSignal};

/// Delivery side of the relay: whatever owns the sockets implements this so
/// the relay can reach a participant by id.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a message for one participant. Unknown ids are logged and skipped.
    async fn send_signal(&self, peer_id: PeerId, msg: ServerSignal);
}
