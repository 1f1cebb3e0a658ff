//! Centralized error type for the tapedeck umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tapedeck_core::Error),

    #[cfg(feature = "std")]
    #[error("Input: {0}")]
    Input(#[from] tapedeck_input::Error),

    #[error("No input source attached")]
    NoInputSource,

    #[error("Input source was lost; attach or open a new one")]
    InputLost,

    #[error("Render domain has not caught up with earlier stops; render and retry")]
    Busy,

    #[error("No output device; the engine renders offline")]
    NoOutputDevice,
}

pub type Result<T> = std::result::Result<T, Error>;
