//! Real-time render domain for the tapedeck engine.
//!
//! # Primary API
//!
//! - [`RenderEngine`] / [`ControlLink`]: the block renderer and the control-side
//!   ends of its channels
//! - [`FrameClock`]: absolute sample clock shared by every renderer
//! - [`MetronomeRenderer`], [`PlaybackRenderer`], [`RecorderRenderer`]
//! - [`TrackBuffer`]: fixed-capacity stereo storage handed to playback
//! - [`RenderCommand`] / [`RenderNotification`]: typed messages across the
//!   control/render boundary
//! - [`OfflineDriver`]: manual block-by-block rendering without a device
//!
//! # Feature-gated APIs
//!
//! - `"std"`: CPAL audio output (enabled by default)
//!
//! # Example
//!
//! ```
//! use tapedeck_core::{EngineConfig, MetronomeUpdate, OfflineDriver, RenderCommand, RenderEngine};
//!
//! let (engine, mut link) = RenderEngine::new(&EngineConfig::default());
//! let mut driver = OfflineDriver::new(engine);
//!
//! link.commands
//!     .send(RenderCommand::Metronome(MetronomeUpdate {
//!         start_frame: Some(0),
//!         ..Default::default()
//!     }))
//!     .unwrap();
//!
//! let out = driver.render_blocks(8);
//! assert!(out.iter().any(|&s| s != 0.0));
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{EngineConfig, MAX_OPEN_SESSIONS, MAX_RETIRED_INPUTS, TRACK_COUNT};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod units;
pub use units::{db_to_linear, frames_per_beat, linear_to_db, MAX_BPM, MIN_BPM};

mod smooth;
pub use smooth::SmoothedValue;

mod clock;
pub use clock::{ClockDriver, FrameClock};

mod track;
pub use track::{TrackBuffer, WriteSummary};

mod batch;
pub use batch::{batch_pool, BatchRecycler, BatchSource, CaptureBatch};

mod input;
pub use input::{input_channel, InputFeed, InputStatus, InputWriter};

pub mod command;
pub use command::{
    GainTarget, MetronomeUpdate, NotificationReceiver, NotificationSender, PlaybackParams,
    RenderCommand, RenderNotification,
};

mod metronome;
pub use metronome::{Beat, MetronomeRenderer, BEAT_HZ, DOWNBEAT_HZ};

mod playback;
pub use playback::PlaybackRenderer;

mod recorder;
pub use recorder::RecorderRenderer;

mod render;
pub use render::{ControlLink, RenderEngine};

mod offline;
pub use offline::OfflineDriver;

#[cfg(feature = "std")]
mod output;
#[cfg(feature = "std")]
pub use output::{list_output_devices, OutputDevice, OutputDeviceInfo, OutputStream};
