use crate::channel::DirectChannel;
use ferry_core::{Frame, PeerId};
use std::fmt;
use std::sync::Arc;

/// One connection attempt to a remote participant.
///
/// A remote that leaves and comes back gets a fresh generation, so callbacks
/// still in flight from its old connection can be told apart from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub remote: PeerId,
    pub generation: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote, self.generation)
    }
}

/// Events the WebRTC layer emits for the client loop.
pub enum PeerEvent {
    /// A local ICE candidate to forward to the remote peer.
    CandidateGenerated(SessionKey, String),

    /// The data channel is open and ready for frames.
    ChannelOpen(SessionKey, Arc<dyn DirectChannel>),

    Frame(SessionKey, Frame),

    /// The connection or its data channel went away.
    Disconnected(SessionKey),
}

impl PeerEvent {
    pub fn key(&self) -> SessionKey {
        match self {
            PeerEvent::CandidateGenerated(key, _)
            | PeerEvent::ChannelOpen(key, _)
            | PeerEvent::Frame(key, _)
            | PeerEvent::Disconnected(key) => *key,
        }
    }
}
