//! Latency to block size conversion

/// Fixed operating sample rate in Hz
pub const SAMPLE_RATE: u32 = 44_100;

pub const MIN_LATENCY_MS: u32 = 5;
pub const MAX_LATENCY_MS: u32 = 100;
pub const DEFAULT_LATENCY_MS: u32 = 20;

/// Clamp a requested latency into the supported range
pub fn clamp_latency(latency_ms: i32) -> u32 {
    latency_ms.clamp(MIN_LATENCY_MS as i32, MAX_LATENCY_MS as i32) as u32
}

/// Frames per callback for a latency request
///
/// The latency is clamped first, then `floor(sample_rate * ms / 1000)`.
pub fn block_size(latency_ms: i32, sample_rate: u32) -> u32 {
    let ms = u64::from(clamp_latency(latency_ms));
    (u64::from(sample_rate) * ms / 1000) as u32
}
