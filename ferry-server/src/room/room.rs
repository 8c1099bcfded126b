use ferry_core::{PeerId, RoomId};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A named rendezvous scope and the participants currently in it.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    members: HashSet<PeerId>,
    created_at: Instant,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            members: HashSet::new(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Time since the first participant created the room.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.contains(peer_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &PeerId> {
        self.members.iter()
    }

    pub(crate) fn insert(&mut self, peer_id: PeerId) -> bool {
        self.members.insert(peer_id)
    }

    pub(crate) fn remove(&mut self, peer_id: &PeerId) -> bool {
        self.members.remove(peer_id)
    }
}
