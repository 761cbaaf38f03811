//! cpal Duplex Stream
//!
//! cpal has no native duplex stream, so one is assembled from an input
//! stream on the default capture device and an output stream on the default
//! playback device, joined by a lock-free SPSC ring buffer:
//!
//! ```text
//!   Mic ──capture cb──▶ rtrb ──output cb──▶ BlockHandler ──▶ Headset
//!                         │                      ▲
//!                         └── StatusFlags ───────┘
//! ```
//!
//! The ring is pre-filled with one block of silence so the first playback
//! callback has a full block to hand to the handler. Overflow, underflow and
//! error-callback conditions are latched into atomics and reported to the
//! handler on the next playback block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, Device, Host, PauseStreamError, PlayStreamError, Stream, StreamError};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info};

use crate::error::PlatformError;
use crate::traits::{AudioBackend, BlockHandler, DuplexConfig, DuplexStream, StreamStatus};

/// Ring capacity in blocks
const RING_BLOCKS: usize = 4;

/// Conditions latched by one callback and consumed by the playback callback
#[derive(Default)]
struct StatusFlags {
    input_overflow: AtomicBool,
    device_error: AtomicBool,
}

impl StatusFlags {
    fn take(&self) -> StreamStatus {
        StreamStatus {
            input_overflow: self.input_overflow.swap(false, Ordering::Relaxed),
            output_underflow: false,
            device_error: self.device_error.swap(false, Ordering::Relaxed),
        }
    }

    fn flag_device_error(&self, _err: StreamError) {
        self.device_error.store(true, Ordering::Relaxed);
    }
}

/// Backend driving the system default input and output devices through cpal
pub struct CpalBackend {
    host: Host,
    name: String,
}

impl CpalBackend {
    pub fn new() -> Self {
        let host = cpal::default_host();
        let name = format!("cpal/{}", host.id().name());
        Self { host, name }
    }

    fn default_devices(&self) -> Result<(Device, Device), PlatformError> {
        let input = self
            .host
            .default_input_device()
            .ok_or_else(|| PlatformError::DeviceUnavailable("no default input device".into()))?;
        let output = self
            .host
            .default_output_device()
            .ok_or_else(|| PlatformError::DeviceUnavailable("no default output device".into()))?;
        Ok((input, output))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    type Stream = CpalDuplexStream;

    fn name(&self) -> &str {
        &self.name
    }

    fn open_duplex<H: BlockHandler>(
        &mut self,
        config: &DuplexConfig,
        handler: H,
    ) -> Result<Self::Stream, PlatformError> {
        if config.block_size == 0 || config.channels == 0 {
            return Err(PlatformError::UnsupportedConfig(format!(
                "block size {} with {} channels",
                config.block_size, config.channels
            )));
        }

        let (input_device, output_device) = self.default_devices()?;
        info!(
            "Opening duplex stream: {} -> {} ({} Hz, {} frames, {} ch)",
            device_name(&input_device),
            device_name(&output_device),
            config.sample_rate,
            config.block_size,
            config.channels
        );

        let cpal_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.block_size),
        };

        let block_samples = config.samples_per_block();
        let (mut producer, consumer) = RingBuffer::<f32>::new(block_samples * RING_BLOCKS);
        if let Ok(chunk) = producer.write_chunk_uninit(block_samples) {
            chunk.fill_from_iter(std::iter::repeat(0.0));
        }

        let flags = Arc::new(StatusFlags::default());

        let input =
            build_capture_stream(&input_device, &cpal_config, producer, Arc::clone(&flags))?;
        let output = build_playback_stream(
            &output_device,
            &cpal_config,
            consumer,
            block_samples,
            handler,
            flags,
        )?;

        Ok(CpalDuplexStream { input, output })
    }
}

/// An opened cpal input/output stream pair
pub struct CpalDuplexStream {
    input: Stream,
    output: Stream,
}

impl DuplexStream for CpalDuplexStream {
    fn start(&mut self) -> Result<(), PlatformError> {
        self.input.play()?;
        self.output.play()?;
        debug!("Duplex stream playing");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        // Attempt both pauses even if the first one fails
        let output = self.output.pause();
        let input = self.input.pause();
        output?;
        input?;
        debug!("Duplex stream paused");
        Ok(())
    }

    fn close(self) -> Result<(), PlatformError> {
        // Dropping a cpal stream tears down the native stream and joins its
        // callback thread, so no callback can run after this returns.
        drop(self.output);
        drop(self.input);
        debug!("Duplex stream closed");
        Ok(())
    }
}

fn build_capture_stream(
    device: &Device,
    config: &cpal::StreamConfig,
    mut producer: Producer<f32>,
    flags: Arc<StatusFlags>,
) -> Result<Stream, PlatformError> {
    let err_flags = Arc::clone(&flags);

    let stream = device.build_input_stream(
        config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Real-time audio callback - NO allocations allowed here
            let writable = data.len().min(producer.slots());
            if let Ok(chunk) = producer.write_chunk_uninit(writable) {
                chunk.fill_from_iter(data.iter().copied());
            }
            if writable < data.len() {
                flags.input_overflow.store(true, Ordering::Relaxed);
            }
        },
        move |err| err_flags.flag_device_error(err),
        None,
    )?;

    Ok(stream)
}

fn build_playback_stream<H: BlockHandler>(
    device: &Device,
    config: &cpal::StreamConfig,
    mut consumer: Consumer<f32>,
    block_samples: usize,
    mut handler: H,
    flags: Arc<StatusFlags>,
) -> Result<Stream, PlatformError> {
    let err_flags = Arc::clone(&flags);

    // Allocated once here, reused by every callback
    let mut scratch = vec![0.0_f32; block_samples.max(1)];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Real-time audio callback - NO allocations allowed here
            let block_len = scratch.len();
            for out_block in data.chunks_mut(block_len) {
                let wanted = out_block.len();
                let input = &mut scratch[..wanted];
                let mut status = flags.take();

                let available = consumer.slots().min(wanted);
                if let Ok(chunk) = consumer.read_chunk(available) {
                    let (first, second) = chunk.as_slices();
                    input[..first.len()].copy_from_slice(first);
                    input[first.len()..first.len() + second.len()].copy_from_slice(second);
                    chunk.commit_all();
                }
                if available < wanted {
                    input[available..].fill(0.0);
                    status.output_underflow = true;
                }

                handler.process(input, out_block, status);
            }
        },
        move |err| err_flags.flag_device_error(err),
        None,
    )?;

    Ok(stream)
}

fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "<unknown>".to_string())
}

impl From<BuildStreamError> for PlatformError {
    fn from(err: BuildStreamError) -> Self {
        match err {
            BuildStreamError::DeviceNotAvailable => {
                PlatformError::DeviceUnavailable(err.to_string())
            }
            BuildStreamError::StreamConfigNotSupported => {
                PlatformError::UnsupportedConfig(err.to_string())
            }
            other => PlatformError::Backend(other.to_string()),
        }
    }
}

impl From<PlayStreamError> for PlatformError {
    fn from(err: PlayStreamError) -> Self {
        match err {
            PlayStreamError::DeviceNotAvailable => {
                PlatformError::DeviceUnavailable(err.to_string())
            }
            other => PlatformError::DeviceRuntime(other.to_string()),
        }
    }
}

impl From<PauseStreamError> for PlatformError {
    fn from(err: PauseStreamError) -> Self {
        match err {
            PauseStreamError::DeviceNotAvailable => {
                PlatformError::DeviceUnavailable(err.to_string())
            }
            other => PlatformError::DeviceRuntime(other.to_string()),
        }
    }
}
