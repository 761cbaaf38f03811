//! Platform Error Types

use thiserror::Error;

/// Errors raised at the native audio backend boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The device could not be opened (missing, unplugged, busy)
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device failed while the stream was being driven
    #[error("Audio device error: {0}")]
    DeviceRuntime(String),

    #[error("Unsupported stream configuration: {0}")]
    UnsupportedConfig(String),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl PlatformError {
    /// Whether this failure originated at the device rather than the backend itself
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            PlatformError::DeviceUnavailable(_) | PlatformError::DeviceRuntime(_)
        )
    }
}
