//! # Tapedeck - Multi-track Recording Engine
//!
//! A metronome, sixteen looping playback tracks and per-track recorders
//! rendered against one sample-accurate frame clock.
//!
//! ## Architecture
//!
//! Tapedeck is an umbrella crate that coordinates:
//! - **tapedeck-core** - Render domain (frame clock, metronome, playback,
//!   recorder, command/notification channels, CPAL output)
//! - **tapedeck-input** - Audio input devices
//!
//! The [`Engine`] lives on the control side. It never touches the audio
//! callback directly: every change travels as a command, and captured audio
//! comes back as frame-tagged batches that [`Engine::pump`] writes into the
//! tracks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tapedeck::prelude::*;
//!
//! let engine = Engine::builder().bpm(96.0).build()?;
//! engine.open_input(None)?;
//!
//! engine.record(0)?;          // starts the transport and the metronome
//! // ... call engine.pump() from the UI loop ...
//! engine.stop()?;
//!
//! engine.set_loop(0, 0, 0, true)?;
//! engine.play()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` - CPAL output and input devices (default). Without it only
//!   offline rendering is available, fed by an attached `InputFeed`.

/// Re-export of tapedeck-core for direct access
pub use tapedeck_core as core;

/// Re-export of tapedeck-input for direct access
#[cfg(feature = "std")]
pub use tapedeck_input as input;

pub use tapedeck_core::{
    db_to_linear, frames_per_beat, linear_to_db, EngineConfig, FrameClock, OfflineDriver,
    TrackBuffer, MAX_BPM, MIN_BPM, TRACK_COUNT,
};

#[cfg(feature = "std")]
pub use tapedeck_core::OutputDeviceInfo;

#[cfg(feature = "std")]
pub use tapedeck_input::InputDeviceInfo;

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;
mod events;
mod session;
mod transport;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use events::EngineEvent;
pub use transport::{TransportReader, TransportSnapshot};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Engine, EngineBuilder, EngineEvent};

    pub use crate::{EngineConfig, OfflineDriver, TransportSnapshot, TRACK_COUNT};

    pub use crate::{db_to_linear, linear_to_db};
}
