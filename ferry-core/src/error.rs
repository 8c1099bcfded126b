use thiserror::Error;

/// Capacity and rate limits. Reported to the client, which cannot proceed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("too many connections from this address (limit {limit})")]
    TooManyConnections { limit: usize },

    #[error("invalid room id: must be 1..={max_len} characters")]
    InvalidRoomId { max_len: usize },

    #[error("room is full ({limit} participants)")]
    RoomFull { limit: usize },

    #[error("server is at capacity ({limit} rooms)")]
    ServerAtCapacity { limit: usize },

    #[error("participant id is already registered")]
    DuplicateParticipant,
}

/// Malformed or misrouted signaling input. Dropped and logged, never sent back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message is not a valid signal: {0}")]
    Malformed(String),

    #[error("message payload is empty")]
    EmptyPayload,

    #[error("message is addressed to its sender")]
    SelfAddressed,

    #[error("sender has not joined a room")]
    NotInRoom,

    #[error("recipient is not in the sender's room")]
    UnknownRecipient,
}
