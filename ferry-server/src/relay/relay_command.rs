use ferry_core::{AdmissionError, ClientSignal, PeerId};
use std::net::IpAddr;
use tokio::sync::oneshot;

/// Commands the socket layer sends to the relay.
#[derive(Debug)]
pub enum RelayCommand {
    /// A socket was accepted and wants a participant slot.
    Connect {
        peer_id: PeerId,
        addr: IpAddr,
        reply: oneshot::Sender<Result<(), AdmissionError>>,
    },

    /// A well-formed message from a connected participant.
    Signal { peer_id: PeerId, signal: ClientSignal },

    /// The socket closed, errored or went idle.
    Disconnect { peer_id: PeerId },
}
