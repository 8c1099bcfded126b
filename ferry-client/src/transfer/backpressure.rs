use crate::channel::DirectChannel;
use crate::config::ClientConfig;
use crate::error::ChannelError;
use std::time::Duration;
use tracing::debug;

/// Hysteresis gate in front of a channel's send buffer.
///
/// Once more than `high` bytes are pending, sending stays suspended until the
/// buffer drains to `low` or below.
#[derive(Debug, Clone, Copy)]
pub struct Backpressure {
    high: usize,
    low: usize,
    poll: Duration,
}

impl Backpressure {
    pub fn new(high: usize, low: usize, poll: Duration) -> Self {
        Self { high, low, poll }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.high_water_mark,
            config.low_water_mark,
            config.backpressure_poll,
        )
    }

    /// Returns once `channel` may take another frame.
    pub async fn ready(&self, channel: &dyn DirectChannel) -> Result<(), ChannelError> {
        if !channel.is_open() {
            return Err(ChannelError::Closed);
        }

        let pending = channel.pending_bytes().await;
        if pending <= self.high {
            return Ok(());
        }

        debug!(
            "Backpressure: {} bytes pending, waiting for {}",
            pending, self.low
        );

        loop {
            tokio::select! {
                _ = channel.drained() => {}
                _ = tokio::time::sleep(self.poll) => {}
            }

            if !channel.is_open() {
                return Err(ChannelError::Closed);
            }
            if channel.pending_bytes().await <= self.low {
                debug!("Backpressure released");
                return Ok(());
            }
        }
    }
}
