//! Engine Error Types

use micmon_platform::PlatformError;
use thiserror::Error;

/// Errors that can occur in the audio engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to open audio stream: {0}")]
    StreamOpen(#[source] PlatformError),

    #[error("Failed to start audio stream: {0}")]
    StreamStart(#[source] PlatformError),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Could not determine settings directory")]
    NoSettingsDir,

    #[error("Settings I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the failure came from the audio device rather than the backend
    pub fn is_device_error(&self) -> bool {
        match self {
            EngineError::StreamOpen(e) | EngineError::StreamStart(e) => e.is_device_error(),
            _ => false,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
