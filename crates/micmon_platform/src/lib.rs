//! MicMonitor Platform - Native Audio Backend
//!
//! This crate defines the contract between the audio engine and the native
//! audio API, and provides the default implementation on top of cpal:
//! - `AudioBackend` opens duplex streams on the system default devices
//! - `DuplexStream` is the native handle (start / stop / close)
//! - `BlockHandler` is the real-time routine the backend invokes per block
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  open_duplex(config, handler)  ┌─────────────────┐
//! │ Audio Engine │ ─────────────────────────────▶ │  AudioBackend   │
//! │ (control)    │ ◀── DuplexStream handle ────── │  (CpalBackend)  │
//! └──────────────┘                                └─────────────────┘
//!                                                          │ audio thread
//!                                                          ▼
//!                                             BlockHandler::process(in, out, status)
//! ```

mod cpal_duplex;
mod error;
mod traits;

pub use cpal_duplex::{CpalBackend, CpalDuplexStream};
pub use error::PlatformError;
pub use traits::{AudioBackend, BlockHandler, DuplexConfig, DuplexStream, StreamStatus};

