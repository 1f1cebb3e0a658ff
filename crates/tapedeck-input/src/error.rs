//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Device not found.
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Sample format the stream cannot convert.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Failed to enumerate devices.
    #[error("Failed to enumerate audio devices")]
    DevicesError(#[from] cpal::DevicesError),

    /// Failed to read the device name.
    #[error("Failed to get audio device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    /// Failed to get device config.
    #[error("Failed to get audio device config")]
    DeviceConfigError(#[from] cpal::DefaultStreamConfigError),

    /// Failed to build stream.
    #[error("Failed to build audio stream")]
    BuildStreamError(#[from] cpal::BuildStreamError),

    /// Failed to play stream.
    #[error("Failed to play audio stream")]
    PlayStreamError(#[from] cpal::PlayStreamError),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
