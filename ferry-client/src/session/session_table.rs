use crate::channel::DirectChannel;
use crate::session::{PeerSession, SessionKey, SessionState};
use ferry_core::PeerId;
use std::collections::HashMap;
use std::sync::Arc;

/// Every peer session of the local client, keyed by remote id.
///
/// At most one session exists per remote. Closed sessions are removed, so a
/// remote that comes back starts over under a new [`SessionKey`].
#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<PeerId, PeerSession>,
    next_generation: u64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// False while a handshaking or open session with `remote` exists.
    pub fn can_start(&self, remote: &PeerId) -> bool {
        !self.sessions.get(remote).is_some_and(PeerSession::is_live)
    }

    pub fn next_key(&mut self, remote: PeerId) -> SessionKey {
        self.next_generation += 1;
        SessionKey {
            remote,
            generation: self.next_generation,
        }
    }

    /// Stores `session`, returning the one it replaces.
    pub fn insert(&mut self, session: PeerSession) -> Option<PeerSession> {
        self.sessions.insert(session.remote(), session)
    }

    pub fn get(&self, remote: &PeerId) -> Option<&PeerSession> {
        self.sessions.get(remote)
    }

    /// The session `key` was issued for, unless it has been replaced since.
    pub fn current_mut(&mut self, key: &SessionKey) -> Option<&mut PeerSession> {
        self.sessions
            .get_mut(&key.remote)
            .filter(|session| session.key() == *key)
    }

    pub fn remove(&mut self, remote: &PeerId) -> Option<PeerSession> {
        self.sessions.remove(remote)
    }

    /// Removes the session only if `key` still refers to it.
    pub fn remove_current(&mut self, key: &SessionKey) -> Option<PeerSession> {
        self.current_mut(key)?;
        self.sessions.remove(&key.remote)
    }

    pub fn remotes(&self) -> Vec<PeerId> {
        self.sessions.keys().copied().collect()
    }

    pub fn open_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.state() == SessionState::Open)
            .count()
    }

    /// Channels of every open session, for an outbound fan-out snapshot.
    pub fn open_channels(&self) -> Vec<(PeerId, Arc<dyn DirectChannel>)> {
        self.sessions
            .values()
            .filter(|s| s.state() == SessionState::Open)
            .filter_map(|s| s.channel().map(|c| (s.remote(), c.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
