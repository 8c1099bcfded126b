use crate::transfer::FileData;
use ferry_core::{PeerId, RoomId, TransferDirection, TransferRecord};
use std::time::Duration;

/// Notifications from the client loop to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The relay accepted the connection and assigned an id.
    Connected { peer_id: PeerId },
    RoomJoined { room_id: RoomId },
    /// Number of peers with an open direct channel.
    PeerCountChanged(usize),
    TransferStarted {
        direction: TransferDirection,
        name: String,
        size: u64,
    },
    TransferProgress {
        direction: TransferDirection,
        fraction: f64,
        speed: f64,
        eta: Option<Duration>,
    },
    TransferComplete(TransferRecord),
    FileReceived { from: PeerId, file: FileData },
    TransferFailed { reason: String },
    PeerDisconnected(PeerId),
    ServerError(String),
}
