use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    Sent,
    Received,
}

/// Summary of one completed transfer. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferRecord {
    pub direction: TransferDirection,
    pub name: String,
    pub size: u64,
    pub duration: Duration,
    /// Bytes per second over the whole transfer.
    pub average_speed: f64,
}

impl TransferRecord {
    pub fn new(direction: TransferDirection, name: String, size: u64, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        let average_speed = if secs > 0.0 { size as f64 / secs } else { 0.0 };

        Self {
            direction,
            name,
            size,
            duration,
            average_speed,
        }
    }
}

/// Append-only log of completed transfers, one list per direction.
#[derive(Debug, Clone, Default)]
pub struct TransferHistory {
    sent: Vec<TransferRecord>,
    received: Vec<TransferRecord>,
}

impl TransferHistory {
    pub fn push(&mut self, record: TransferRecord) {
        match record.direction {
            TransferDirection::Sent => self.sent.push(record),
            TransferDirection::Received => self.received.push(record),
        }
    }

    pub fn sent(&self) -> &[TransferRecord] {
        &self.sent
    }

    pub fn received(&self) -> &[TransferRecord] {
        &self.received
    }
}
