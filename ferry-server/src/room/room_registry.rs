use crate::config::ServerConfig;
use crate::room::Room;
use ferry_core::{AdmissionError, PeerId, RoomId};
use std::collections::HashMap;
use tracing::{debug, info};

/// Result of a successful [`RoomRegistry::join`].
#[derive(Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    /// Members that were already present and must hear about the newcomer.
    pub existing: Vec<PeerId>,
    /// The room the participant had to leave first, if any.
    pub left: Option<LeaveOutcome>,
    /// The participant was already a member; nothing changed.
    pub already_member: bool,
}

/// Result of removing a participant from its room.
#[derive(Debug, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room_id: RoomId,
    pub remaining: Vec<PeerId>,
    pub room_closed: bool,
}

/// Room membership. Keeps the room member sets and the participant→room
/// index in lockstep: every mutation touches both or neither.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    membership: HashMap<PeerId, RoomId>,
    max_users_per_room: usize,
    max_rooms: usize,
    max_room_id_len: usize,
}

impl RoomRegistry {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            membership: HashMap::new(),
            max_users_per_room: config.max_users_per_room,
            max_rooms: config.max_rooms,
            max_room_id_len: config.max_room_id_len,
        }
    }

    pub fn join(&mut self, peer_id: PeerId, room_id: RoomId) -> Result<JoinOutcome, AdmissionError> {
        let room_id = self.validate_room_id(room_id)?;

        if self.membership.get(&peer_id) == Some(&room_id) {
            let existing = self.others_in(&room_id, &peer_id);
            return Ok(JoinOutcome {
                room_id,
                existing,
                left: None,
                already_member: true,
            });
        }

        // Leaving a room we are alone in frees its slot for the new one.
        let freed = self
            .membership
            .get(&peer_id)
            .and_then(|current| self.rooms.get(current))
            .is_some_and(|room| room.len() == 1);
        let open_rooms = self.rooms.len() - usize::from(freed);

        match self.rooms.get(&room_id) {
            Some(room) if room.len() >= self.max_users_per_room => {
                return Err(AdmissionError::RoomFull {
                    limit: self.max_users_per_room,
                });
            }
            None if open_rooms >= self.max_rooms => {
                return Err(AdmissionError::ServerAtCapacity {
                    limit: self.max_rooms,
                });
            }
            _ => {}
        }

        let left = self.leave(&peer_id);

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone())
        });
        let existing: Vec<PeerId> = room.members().copied().collect();
        room.insert(peer_id);
        self.membership.insert(peer_id, room_id.clone());

        debug!(
            "Peer {} joined room {} ({} members)",
            peer_id,
            room_id,
            existing.len() + 1
        );

        Ok(JoinOutcome {
            room_id,
            existing,
            left,
            already_member: false,
        })
    }

    /// Removes the participant from whatever room it is in. Idempotent.
    pub fn leave(&mut self, peer_id: &PeerId) -> Option<LeaveOutcome> {
        let room_id = self.membership.remove(peer_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        room.remove(peer_id);

        let remaining: Vec<PeerId> = room.members().copied().collect();
        let room_closed = room.is_empty();
        if room_closed {
            if let Some(room) = self.rooms.remove(&room_id) {
                info!(
                    "Room {} is empty, removed after {:.1?}",
                    room.id(),
                    room.age()
                );
            }
        }

        Some(LeaveOutcome {
            room_id,
            remaining,
            room_closed,
        })
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.membership.get(peer_id)
    }

    pub fn share_room(&self, a: &PeerId, b: &PeerId) -> bool {
        match (self.membership.get(a), self.membership.get(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.membership.len()
    }

    fn others_in(&self, room_id: &RoomId, peer_id: &PeerId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().filter(|id| *id != peer_id).copied().collect())
            .unwrap_or_default()
    }

    fn validate_room_id(&self, room_id: RoomId) -> Result<RoomId, AdmissionError> {
        let trimmed = room_id.as_str().trim();
        let len = trimmed.chars().count();
        if len == 0 || len > self.max_room_id_len {
            return Err(AdmissionError::InvalidRoomId {
                max_len: self.max_room_id_len,
            });
        }
        Ok(RoomId::from(trimmed))
    }
}
