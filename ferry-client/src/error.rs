use crate::session::SessionState;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk size {size} outside {min}..={max}")]
    ChunkSizeOutOfRange { size: usize, min: usize, max: usize },

    #[error("low water mark {low} is above high water mark {high}")]
    WaterMarks { low: usize, high: usize },

    #[error("stats interval must be at least one chunk")]
    ZeroStatsInterval,

    #[error("keepalive interval must be non-zero")]
    ZeroKeepalive,
}

/// Failures of a single direct channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// Normal cleanup path once the remote side or the local session goes away.
    #[error("channel closed")]
    Closed,

    /// Transient. The caller may retry the same frame.
    #[error("send failed: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session transition {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("a transfer is already in progress")]
    AlreadyInProgress,

    #[error("no open peer connections")]
    NoRecipients,

    #[error("transfer aborted: {0}")]
    Aborted(String),

    #[error("received {actual} bytes but {declared} were declared")]
    SizeMismatch { declared: u64, actual: u64 },
}
