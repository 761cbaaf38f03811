//! Engine and Stream Configuration

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use micmon_platform::DuplexConfig;
use serde::{Deserialize, Serialize};

use crate::latency::{self, DEFAULT_LATENCY_MS, SAMPLE_RATE};

pub const MIN_VOLUME: u8 = 0;
pub const MAX_VOLUME: u8 = 100;
pub const DEFAULT_VOLUME: u8 = 50;

/// Clamp a requested volume into [0, 100]
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(MIN_VOLUME as i32, MAX_VOLUME as i32) as u8
}

/// Audio stream configuration, fixed for the lifetime of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of audio channels (always mono for monitoring)
    pub channels: u16,

    /// Buffer size in frames
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::for_latency(DEFAULT_LATENCY_MS as i32)
    }
}

impl StreamConfig {
    /// Mono stream at the fixed sample rate sized for a latency request
    pub fn for_latency(latency_ms: i32) -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            buffer_size: latency::block_size(latency_ms, SAMPLE_RATE),
        }
    }

    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(format!("Invalid channel count: {}", self.channels));
        }
        if self.buffer_size == 0 {
            return Err(format!("Invalid buffer size: {}", self.buffer_size));
        }
        Ok(())
    }

    pub fn to_duplex(&self) -> DuplexConfig {
        DuplexConfig {
            sample_rate: self.sample_rate,
            block_size: self.buffer_size,
            channels: self.channels,
        }
    }
}

/// Control values shared between the control thread and the audio callback
///
/// Both scalars are atomics: the control thread writes, the audio thread
/// reads once per block. Relaxed ordering is enough because each value is
/// independent and a one-block-stale read is harmless.
#[derive(Debug)]
pub struct EngineConfig {
    volume: AtomicU8,
    latency_ms: AtomicU32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume: AtomicU8::new(DEFAULT_VOLUME),
            latency_ms: AtomicU32::new(DEFAULT_LATENCY_MS),
        }
    }
}

impl EngineConfig {
    /// Create a config, clamping both values into range
    pub fn new(volume: i32, latency_ms: i32) -> Self {
        Self {
            volume: AtomicU8::new(clamp_volume(volume)),
            latency_ms: AtomicU32::new(latency::clamp_latency(latency_ms)),
        }
    }

    /// Store a clamped volume and return the stored value
    pub fn set_volume(&self, volume: i32) -> u8 {
        let volume = clamp_volume(volume);
        self.volume.store(volume, Ordering::Relaxed);
        volume
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    /// Linear gain for the current volume (0.0 - 1.0)
    #[inline]
    pub fn gain(&self) -> f32 {
        self.volume() as f32 / 100.0
    }

    /// Store a clamped latency and return the stored value
    pub fn set_latency_ms(&self, latency_ms: i32) -> u32 {
        let latency_ms = latency::clamp_latency(latency_ms);
        self.latency_ms.store(latency_ms, Ordering::Relaxed);
        latency_ms
    }

    pub fn latency_ms(&self) -> u32 {
        self.latency_ms.load(Ordering::Relaxed)
    }

    /// Stream configuration for the current latency
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::for_latency(self.latency_ms() as i32)
    }
}
