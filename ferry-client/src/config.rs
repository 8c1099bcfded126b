use crate::error::ConfigError;
use ferry_core::IceServerConfig;
use ferry_core::utils::{
    DEFAULT_CHUNK_SIZE, DEFAULT_HIGH_WATER_MARK, DEFAULT_LOW_WATER_MARK, DEFAULT_SIGNALING_URL,
    DEFAULT_STATS_INTERVAL_CHUNKS, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
use std::time::Duration;

/// Client-side tuning. Defaults match what browsers handle comfortably.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Websocket endpoint of the relay, e.g. `ws://host:3000/ws`.
    pub signaling_url: String,
    /// Overrides the list announced by the server when non-empty.
    pub ice_servers: Vec<IceServerConfig>,
    pub chunk_size: usize,
    /// Sending pauses once a channel has more than this many bytes queued...
    pub high_water_mark: usize,
    /// ...and resumes when it is back at or below this.
    pub low_water_mark: usize,
    pub stats_interval_chunks: u64,
    pub send_retry_delay: Duration,
    pub max_send_retries: u32,
    pub backpressure_poll: Duration,
    /// Websocket ping period. Keeps the relay from closing the signaling
    /// connection as idle while transfers run peer to peer.
    pub keepalive_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_owned(),
            ice_servers: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            stats_interval_chunks: DEFAULT_STATS_INTERVAL_CHUNKS,
            send_retry_delay: Duration::from_millis(5),
            max_send_retries: 10,
            backpressure_poll: Duration::from_millis(1),
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::ChunkSizeOutOfRange {
                size: self.chunk_size,
                min: MIN_CHUNK_SIZE,
                max: MAX_CHUNK_SIZE,
            });
        }
        if self.low_water_mark > self.high_water_mark {
            return Err(ConfigError::WaterMarks {
                low: self.low_water_mark,
                high: self.high_water_mark,
            });
        }
        if self.stats_interval_chunks == 0 {
            return Err(ConfigError::ZeroStatsInterval);
        }
        if self.keepalive_interval.is_zero() {
            return Err(ConfigError::ZeroKeepalive);
        }
        Ok(())
    }
}
