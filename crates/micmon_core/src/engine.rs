//! Audio Engine - Stream Lifecycle
//!
//! The `AudioEngine` owns the native duplex stream handle and is the only
//! thing allowed to create or destroy it. It lives on the control thread;
//! the backend's audio thread only ever sees the `CallbackProcessor` handed
//! over at open time.
//!
//! # Thread Model
//!
//! ```text
//!  Control thread                       Audio thread (backend-owned)
//!  ──────────────                       ────────────────────────────
//!  start() ── open_duplex(cfg, proc) ─▶ proc.process(in, out, status)
//!  set_volume() ──▶ EngineConfig ◀──────── gain (atomic load)
//!  last_error() ◀── ErrorReporter ◀─────── post_fault (atomic swap)
//!  stop() ── stop + close (joins) ────▶ no further callbacks
//! ```
//!
//! Backend failures are converted to a `bool` plus a message in the
//! `ErrorReporter` here and never propagate further.

use std::sync::Arc;

use micmon_platform::{AudioBackend, CpalBackend, DuplexStream, PlatformError};
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, StreamConfig};
use crate::error::{EngineError, EngineResult};
use crate::processor::CallbackProcessor;
use crate::reporter::{ErrorMessage, ErrorReporter};

/// Whether a native stream is currently live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    Stopped,
    Running,
}

/// A started native stream and the configuration it was opened with
struct ActiveStream<S> {
    handle: S,
    config: StreamConfig,
}

/// The audio passthrough engine
///
/// Start/stop/restart assume a single serializing control thread.
pub struct AudioEngine<B: AudioBackend = CpalBackend> {
    backend: B,

    /// Present iff the engine is Running
    active: Option<ActiveStream<B::Stream>>,

    /// Shared with every callback processor handed to the backend
    config: Arc<EngineConfig>,
    errors: Arc<ErrorReporter>,
}

impl AudioEngine<CpalBackend> {
    /// Create an engine on the system default audio devices
    pub fn new() -> Self {
        Self::with_backend(CpalBackend::new())
    }
}

impl Default for AudioEngine<CpalBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn with_backend(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        debug!(
            "Audio engine created on {} (volume {}, latency {} ms)",
            backend.name(),
            config.volume(),
            config.latency_ms()
        );
        Self {
            backend,
            active: None,
            config: Arc::new(config),
            errors: Arc::new(ErrorReporter::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> RunningState {
        if self.is_running() {
            RunningState::Running
        } else {
            RunningState::Stopped
        }
    }

    /// Start passthrough; returns `false` on failure with the reason in `last_error()`
    pub fn start(&mut self) -> bool {
        self.try_start().is_ok()
    }

    /// Start passthrough, returning the typed error on failure
    ///
    /// The error is also recorded in the reporter and forwarded to the sink.
    pub fn try_start(&mut self) -> EngineResult<()> {
        if self.is_running() {
            debug!("Start requested while running; ignoring");
            return Ok(());
        }

        self.errors.clear();

        match self.open_and_start() {
            Ok(active) => {
                info!(
                    "Audio passthrough started ({} frames @ {} Hz, {:.1} ms)",
                    active.config.buffer_size,
                    active.config.sample_rate,
                    active.config.latency_ms()
                );
                self.active = Some(active);
                Ok(())
            }
            Err(e) => {
                error!("Failed to start audio passthrough: {}", e);
                self.errors.report(e.to_string());
                Err(e)
            }
        }
    }

    fn open_and_start(&mut self) -> EngineResult<ActiveStream<B::Stream>> {
        let config = self.config.stream_config();
        config.validate().map_err(EngineError::ConfigError)?;

        let processor = CallbackProcessor::new(Arc::clone(&self.config), Arc::clone(&self.errors));
        let mut handle = self
            .backend
            .open_duplex(&config.to_duplex(), processor)
            .map_err(EngineError::StreamOpen)?;

        if let Err(e) = handle.start() {
            // Roll back so no half-open handle survives the failed attempt
            if let Err(close_err) = handle.close() {
                warn!("Error closing stream after failed start: {}", close_err);
            }
            return Err(EngineError::StreamStart(e));
        }

        Ok(ActiveStream { handle, config })
    }

    /// Stop passthrough and release the native stream
    ///
    /// Always leaves the engine Stopped. Errors from the backend while
    /// stopping or closing are logged and discarded. Once this returns the
    /// callback will not run again.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        release_stream(active.handle);
        info!("Audio passthrough stopped");
    }

    /// Set volume (0 - 100); out-of-range values are clamped
    pub fn set_volume(&self, volume: i32) {
        let stored = self.config.set_volume(volume);
        debug!("Volume set to {}", stored);
    }

    pub fn volume(&self) -> u8 {
        self.config.volume()
    }

    /// Set latency (5 - 100 ms); out-of-range values are clamped
    ///
    /// A running stream is restarted with the new block size. If that restart
    /// fails the engine ends up Stopped with the error in `last_error()`.
    pub fn set_latency(&mut self, latency_ms: i32) {
        let stored = self.config.set_latency_ms(latency_ms);
        debug!("Latency set to {} ms", stored);

        if self.is_running() {
            info!("Restarting audio stream for {} ms latency", stored);
            self.stop();
            self.start();
        }
    }

    pub fn latency_ms(&self) -> u32 {
        self.config.latency_ms()
    }

    /// Block size the next start would use
    pub fn block_size(&self) -> u32 {
        self.config.stream_config().buffer_size
    }

    /// Configuration of the live stream, if running
    pub fn active_stream(&self) -> Option<&StreamConfig> {
        self.active.as_ref().map(|active| &active.config)
    }

    /// Register the error notification sink
    ///
    /// The sink is called from the real-time audio thread for callback
    /// faults and must not block.
    pub fn set_error_callback<F>(&self, callback: F)
    where
        F: Fn(ErrorMessage) + Send + Sync + 'static,
    {
        self.errors.set_sink(callback);
    }

    pub fn clear_error_callback(&self) {
        self.errors.clear_sink();
    }

    pub fn last_error(&self) -> Option<ErrorMessage> {
        self.errors.get()
    }

    pub fn clear_error(&self) {
        self.errors.clear();
    }
}

impl<B: AudioBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Best-effort stop and close of a native stream
///
/// Secondary failures are logged, never propagated: the handle is consumed
/// either way.
fn release_stream<S: DuplexStream>(mut handle: S) {
    if let Err(e) = handle.stop() {
        log_release_error("stopping", &e);
    }
    if let Err(e) = handle.close() {
        log_release_error("closing", &e);
    }
}

fn log_release_error(action: &str, err: &PlatformError) {
    warn!("Ignoring error while {} audio stream: {}", action, err);
}
