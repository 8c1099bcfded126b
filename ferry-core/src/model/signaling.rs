use crate::error::ValidationError;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Messages a participant sends to the relay.
///
/// `to` names the recipient; the relay consumes it for routing and the
/// recipient sees the sender as `from` in the matching [`ServerSignal`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d")]
pub enum ClientSignal {
    JoinRoom { room_id: RoomId },
    Offer { to: PeerId, sdp: String },
    Answer { to: PeerId, sdp: String },
    IceCandidate { to: PeerId, candidate: String },
}

impl ClientSignal {
    /// Recipient of a routed message, `None` for room management.
    pub fn target(&self) -> Option<PeerId> {
        match self {
            ClientSignal::JoinRoom { .. } => None,
            ClientSignal::Offer { to, .. }
            | ClientSignal::Answer { to, .. }
            | ClientSignal::IceCandidate { to, .. } => Some(*to),
        }
    }

    /// Structural checks that do not need relay state.
    pub fn validate(&self, sender: &PeerId) -> Result<(), ValidationError> {
        let payload = match self {
            ClientSignal::JoinRoom { .. } => return Ok(()),
            ClientSignal::Offer { sdp, .. } | ClientSignal::Answer { sdp, .. } => sdp,
            ClientSignal::IceCandidate { candidate, .. } => candidate,
        };

        if payload.trim().is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        if self.target().as_ref() == Some(sender) {
            return Err(ValidationError::SelfAddressed);
        }
        Ok(())
    }

    /// Rewrites a routed message into what the recipient receives.
    pub fn into_delivery(self, from: PeerId) -> Option<ServerSignal> {
        match self {
            ClientSignal::JoinRoom { .. } => None,
            ClientSignal::Offer { sdp, .. } => Some(ServerSignal::Offer { from, sdp }),
            ClientSignal::Answer { sdp, .. } => Some(ServerSignal::Answer { from, sdp }),
            ClientSignal::IceCandidate { candidate, .. } => {
                Some(ServerSignal::IceCandidate { from, candidate })
            }
        }
    }
}

/// Messages the relay sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d")]
pub enum ServerSignal {
    Welcome { peer_id: PeerId },
    IceConfig { ice_servers: Vec<IceServerConfig> },
    RoomJoined { room_id: RoomId, peer_count: usize },
    PeerJoined { peer_id: PeerId },
    PeerLeft { peer_id: PeerId },
    Offer { from: PeerId, sdp: String },
    Answer { from: PeerId, sdp: String },
    IceCandidate { from: PeerId, candidate: String },
    Error { message: String },
}
