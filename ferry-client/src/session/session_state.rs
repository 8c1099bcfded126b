use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Creates the data channel and the offer.
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Handshaking,
    Open,
    Closed,
}

impl SessionState {
    /// Handshaking or open. A live session blocks a second one to the same peer.
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Handshaking | SessionState::Open)
    }

    pub fn can_become(self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Idle, Handshaking) | (Handshaking, Open) | (_, Closed)
        )
    }

    pub fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        if !self.can_become(to) {
            return Err(SessionError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}
