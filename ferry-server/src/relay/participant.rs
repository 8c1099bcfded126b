use ferry_core::PeerId;
use std::net::IpAddr;
use std::time::Instant;

/// A connected socket, as the relay sees it.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PeerId,
    pub addr: IpAddr,
    pub joined_at: Instant,
}

impl Participant {
    pub fn new(id: PeerId, addr: IpAddr) -> Self {
        Self {
            id,
            addr,
            joined_at: Instant::now(),
        }
    }
}
