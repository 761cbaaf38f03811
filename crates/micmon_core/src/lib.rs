//! MicMonitor Core - Audio Engine
//!
//! This crate provides the engine behind the MicMonitor background utility:
//! live microphone input passed to the headset output with adjustable
//! volume and latency.
//! - Stream lifecycle (open / start / stop / close, latency restarts)
//! - Real-time gain processing on the backend's audio thread
//! - Lock-free sharing of control values and error state across threads
//! - Persisted last-used settings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │  Host ──start/stop/set_*──▶ AudioEngine ──▶ last_error()    │
//! └─────────────────────────────────────────────────────────────┘
//!            │ Arc<EngineConfig>          ▲ Arc<ErrorReporter>
//!            ▼ (atomic scalars)           │ (atomic pointer swap)
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Audio Thread                          │
//! │        Mic ──▶ CallbackProcessor (gain) ──▶ Headset         │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod engine;
mod error;
pub mod latency;
mod processor;
mod reporter;
mod settings;

#[cfg(test)]
mod testing;

pub use config::{clamp_volume, EngineConfig, StreamConfig, DEFAULT_VOLUME, MAX_VOLUME, MIN_VOLUME};
pub use engine::{AudioEngine, RunningState};
pub use error::{EngineError, EngineResult};
pub use latency::{block_size, SAMPLE_RATE};
pub use processor::CallbackProcessor;
pub use reporter::{ErrorMessage, ErrorReporter, StatusFault};
pub use settings::MonitorSettings;

// Re-export backend types for convenience
pub use micmon_platform::{
    AudioBackend, BlockHandler, CpalBackend, DuplexConfig, DuplexStream, PlatformError,
    StreamStatus,
};
