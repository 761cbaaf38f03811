//! Native Backend Traits
//!
//! Defines the contract between the engine and whatever native audio API
//! drives the duplex stream.

use crate::error::PlatformError;

/// Parameters for opening a duplex stream
///
/// Samples are always 32-bit float, interleaved when `channels > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplexConfig {
    /// Sample rate in Hz, shared by capture and playback
    pub sample_rate: u32,

    /// Frames delivered per callback
    pub block_size: u32,

    /// Channel count (1 = mono)
    pub channels: u16,
}

impl DuplexConfig {
    /// Number of samples in one block across all channels
    pub fn samples_per_block(&self) -> usize {
        self.block_size as usize * self.channels as usize
    }
}

/// Per-block status flags reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatus {
    /// Captured samples were dropped because playback fell behind
    pub input_overflow: bool,

    /// Playback ran out of captured samples and was padded with silence
    pub output_underflow: bool,

    /// The backend reported a device condition since the previous block
    pub device_error: bool,
}

impl StreamStatus {
    pub fn is_ok(&self) -> bool {
        !(self.input_overflow || self.output_underflow || self.device_error)
    }
}

/// Real-time block handler driven by the backend's audio thread
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations
/// - NO blocking (no mutex locks, no I/O, no sleeping)
/// - Every sample of `output` written before returning
/// - No panic may escape
///
/// Catching a panic inside `process()` is a last-resort path, not a
/// real-time safe one: the panic hook still runs on the audio thread and
/// allocates and locks stderr while printing.
pub trait BlockHandler: Send + 'static {
    fn process(&mut self, input: &[f32], output: &mut [f32], status: StreamStatus);
}

/// Handle to an opened duplex stream
pub trait DuplexStream {
    /// Begin invoking the handler
    fn start(&mut self) -> Result<(), PlatformError>;

    /// Pause the stream; the handle stays open
    fn stop(&mut self) -> Result<(), PlatformError>;

    /// Release the native stream
    ///
    /// Must not return until the backend guarantees the handler will not be
    /// invoked again.
    fn close(self) -> Result<(), PlatformError>;
}

/// A native audio API capable of opening duplex streams on the default devices
pub trait AudioBackend {
    type Stream: DuplexStream;

    /// Backend name for logging (e.g. "cpal/ALSA")
    fn name(&self) -> &str;

    /// Open (but do not start) a duplex stream feeding `handler`
    fn open_duplex<H: BlockHandler>(
        &mut self,
        config: &DuplexConfig,
        handler: H,
    ) -> Result<Self::Stream, PlatformError>;
}
