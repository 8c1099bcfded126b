use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:3000/ws";

/// Chunk size used when the caller does not pick one.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

pub const MIN_CHUNK_SIZE: usize = 16 * 1024;

pub const MAX_CHUNK_SIZE: usize = 256 * 1024;

/// Sending pauses once a channel has more than this many unsent bytes...
pub const DEFAULT_HIGH_WATER_MARK: usize = 1024 * 1024;

/// ...and resumes when it drains to this many.
pub const DEFAULT_LOW_WATER_MARK: usize = 256 * 1024;

/// Progress is recomputed every this many chunks (~10 MiB at the default size).
pub const DEFAULT_STATS_INTERVAL_CHUNKS: u64 = 40;

/// Number of chunks needed for `size` bytes.
pub fn total_chunks(size: u64, chunk_size: usize) -> u64 {
    size.div_ceil(chunk_size as u64)
}

/// Renders bytes-per-second with binary units, e.g. `1.5 MB/s`.
pub fn format_speed(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_owned();
    }

    let exp = (bytes_per_sec.ln() / 1024f64.ln()).floor().clamp(0.0, 3.0) as i32;
    let value = bytes_per_sec / 1024f64.powi(exp);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp as usize])
}

/// Renders a remaining-time estimate, e.g. `42s` or `3m 5s`.
pub fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "Calculating...".to_owned();
    };

    let secs = eta.as_secs_f64();
    if secs < 60.0 {
        return format!("{}s", secs.ceil() as u64);
    }
    let mins = (secs / 60.0).floor() as u64;
    format!("{}m {}s", mins, (secs % 60.0).ceil() as u64)
}
