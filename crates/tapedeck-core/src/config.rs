//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of tracks the engine allocates. Track indices run `0..TRACK_COUNT`.
pub const TRACK_COUNT: usize = 16;

/// Recording sessions the controller may hold open at once, active or
/// finishing. Each one is owed exactly one stop marker.
pub const MAX_OPEN_SESSIONS: usize = 2 * TRACK_COUNT;

/// Replaced input feeds that may be on their way back to the control domain.
pub const MAX_RETIRED_INPUTS: usize = 4;

/// Configuration shared by the control and render domains.
///
/// Everything here is fixed once the engine is built: buffers, batch pools and
/// queues are sized from it up front so the render path never allocates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    /// Frames per render block. Must be a power of two.
    pub block_size: usize,
    /// Render blocks per captured batch.
    pub batch_blocks: usize,
    /// Number of preallocated capture batches shared by all recorders.
    pub batch_pool_size: usize,
    /// Capacity of each track buffer, in seconds.
    pub max_track_seconds: f64,
    /// Frames between "now" and the scheduled transport start on `play()`.
    pub scheduling_margin_frames: u64,
    /// Time constant for gain changes, in seconds.
    pub gain_time_constant: f32,
    pub beep_seconds: f64,
    pub default_track_gain: f32,
    pub default_metronome_gain: f32,
    pub default_bpm: f64,
    pub default_beats_per_measure: u32,
    pub command_queue_capacity: usize,
    /// Input ring buffer length, in seconds.
    pub input_buffer_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 128,
            batch_blocks: 16,
            batch_pool_size: 64,
            max_track_seconds: 300.0,
            scheduling_margin_frames: 2048,
            gain_time_constant: 0.05,
            beep_seconds: 0.02,
            default_track_gain: 0.8,
            default_metronome_gain: 0.5,
            default_bpm: 120.0,
            default_beats_per_measure: 4,
            command_queue_capacity: 1024,
            input_buffer_seconds: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !self.block_size.is_power_of_two() || !(16..=4096).contains(&self.block_size) {
            return Err(Error::InvalidConfig(format!(
                "block_size {} must be a power of two in 16..=4096",
                self.block_size
            )));
        }
        if self.batch_blocks == 0 {
            return Err(Error::InvalidConfig("batch_blocks must be at least 1".into()));
        }
        if self.batch_pool_size < 2 {
            return Err(Error::InvalidConfig(
                "batch_pool_size must be at least 2".into(),
            ));
        }
        if self.max_track_seconds <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_track_seconds {} must be positive",
                self.max_track_seconds
            )));
        }
        if self.command_queue_capacity < 4 * TRACK_COUNT {
            return Err(Error::InvalidConfig(format!(
                "command_queue_capacity {} too small (minimum {})",
                self.command_queue_capacity,
                4 * TRACK_COUNT
            )));
        }
        if self.gain_time_constant < 0.0 || self.beep_seconds <= 0.0 {
            return Err(Error::InvalidConfig(
                "gain_time_constant and beep_seconds must be positive".into(),
            ));
        }
        if self.default_beats_per_measure == 0 {
            return Err(Error::InvalidMeter(0));
        }
        crate::units::validate_bpm(self.default_bpm)?;
        Ok(())
    }

    /// Frames per captured batch.
    pub fn batch_frames(&self) -> usize {
        self.block_size * self.batch_blocks
    }

    /// Capacity of each track buffer, in frames.
    pub fn track_capacity(&self) -> usize {
        (self.max_track_seconds * self.sample_rate).round() as usize
    }

    /// Length of the metronome beep, in frames.
    pub fn beep_frames(&self) -> u64 {
        (self.beep_seconds * self.sample_rate).round() as u64
    }

    /// Capacity of the render→control notification channel.
    ///
    /// Batches (partial ones included) all come from the pool, so at most
    /// `batch_pool_size` are ever queued. On top of that the channel holds one
    /// stop marker per open session and every retired input feed. The
    /// controller refuses new sessions and input swaps beyond
    /// [`MAX_OPEN_SESSIONS`] and [`MAX_RETIRED_INPUTS`], so the render domain
    /// never sees a full channel.
    pub fn notification_capacity(&self) -> usize {
        self.batch_pool_size + MAX_OPEN_SESSIONS + MAX_RETIRED_INPUTS
    }
}
