//! Throughput sampling for both directions of a transfer.

use std::time::{Duration, Instant};

/// A point-in-time view of transfer progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Completed share in `0.0..=1.0`.
    pub fraction: f64,
    /// Bytes per second since the transfer started.
    pub speed: f64,
    /// `None` until a non-zero speed has been observed.
    pub eta: Option<Duration>,
}

/// Decides when to sample and computes speed and ETA from bytes moved.
#[derive(Debug, Clone)]
pub struct StatsSampler {
    total_bytes: u64,
    interval_chunks: u64,
    started_at: Instant,
}

impl StatsSampler {
    pub fn new(total_bytes: u64, interval_chunks: u64) -> Self {
        Self {
            total_bytes,
            interval_chunks: interval_chunks.max(1),
            started_at: Instant::now(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// True every `interval_chunks` chunks and on the final chunk.
    pub fn is_due(&self, chunks_done: u64, total_chunks: u64) -> bool {
        chunks_done == total_chunks || chunks_done % self.interval_chunks == 0
    }

    pub fn sample(&self, bytes_done: u64) -> Progress {
        self.sample_at(bytes_done, self.started_at.elapsed())
    }

    pub fn sample_at(&self, bytes_done: u64, elapsed: Duration) -> Progress {
        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 {
            bytes_done as f64 / secs
        } else {
            0.0
        };

        let fraction = if self.total_bytes == 0 {
            1.0
        } else {
            (bytes_done as f64 / self.total_bytes as f64).min(1.0)
        };

        let eta = (speed > 0.0).then(|| {
            let remaining = self.total_bytes.saturating_sub(bytes_done);
            Duration::from_secs_f64(remaining as f64 / speed)
        });

        Progress {
            fraction,
            speed,
            eta,
        }
    }
}
