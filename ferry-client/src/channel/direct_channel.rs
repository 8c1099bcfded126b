use crate::error::ChannelError;
use async_trait::async_trait;
use ferry_core::Frame;

/// An ordered, reliable, message-oriented link to one remote participant.
///
/// Frames arrive at the remote side in the order they were sent. Text frames
/// carry control messages and binary frames carry file chunks.
#[async_trait]
pub trait DirectChannel: Send + Sync {
    async fn send(&self, frame: &Frame) -> Result<(), ChannelError>;

    /// Bytes accepted by `send` that have not left the local buffer yet.
    async fn pending_bytes(&self) -> usize;

    fn is_open(&self) -> bool;

    /// Resolves when the channel reports that its buffer has drained.
    /// Wakeups may be spurious or missed, so waiters must re-check
    /// `pending_bytes` and keep a polling fallback.
    async fn drained(&self);

    async fn close(&self);
}
