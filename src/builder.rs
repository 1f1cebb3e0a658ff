//! Builder for configuring and constructing an [`Engine`].

use crate::{Engine, Result};
use tapedeck_core::{EngineConfig, OfflineDriver, RenderEngine};

#[cfg(feature = "std")]
use tapedeck_core::OutputDevice;

/// Buffers, pools and queues are sized from the builder settings before the
/// first block is rendered.
///
/// With [`build`](Self::build) the sample rate comes from the output device
/// and the `sample_rate` setting is ignored. Use `engine.sample_rate()` after
/// building to query the actual rate.
///
/// # Example
///
/// ```ignore
/// use tapedeck::prelude::*;
///
/// let engine = Engine::builder()
///     .block_size(256)
///     .bpm(96.0)
///     .build()?;
///
/// let sr = engine.sample_rate(); // e.g. 44100.0 or 48000.0
/// engine.open_input(None)?;
/// engine.record(0)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    output_device: Option<usize>,
}

impl EngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Only used by [`build_offline`](Self::build_offline). Default: 48000
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 128
    pub fn block_size(mut self, frames: usize) -> Self {
        self.config.block_size = frames;
        self
    }

    /// Render blocks per captured batch. Default: 16
    pub fn batch_blocks(mut self, blocks: usize) -> Self {
        self.config.batch_blocks = blocks;
        self
    }

    /// Default: 64
    pub fn batch_pool_size(mut self, batches: usize) -> Self {
        self.config.batch_pool_size = batches;
        self
    }

    /// Default: 300
    pub fn max_track_seconds(mut self, seconds: f64) -> Self {
        self.config.max_track_seconds = seconds;
        self
    }

    /// Default: 2048
    pub fn scheduling_margin(mut self, frames: u64) -> Self {
        self.config.scheduling_margin_frames = frames;
        self
    }

    /// Time constant of gain ramps, in seconds. Default: 0.05
    pub fn gain_time_constant(mut self, seconds: f32) -> Self {
        self.config.gain_time_constant = seconds;
        self
    }

    /// Default: 120
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.config.default_bpm = bpm;
        self
    }

    /// Default: 4
    pub fn beats_per_measure(mut self, beats: u32) -> Self {
        self.config.default_beats_per_measure = beats;
        self
    }

    /// Initial linear gain of every track. Default: 0.8
    pub fn track_gain(mut self, gain: f32) -> Self {
        self.config.default_track_gain = gain;
        self
    }

    /// Initial linear metronome gain. Default: 0.5
    pub fn metronome_gain(mut self, gain: f32) -> Self {
        self.config.default_metronome_gain = gain;
        self
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.output_device = Some(index);
        self
    }

    /// Open the output device and start rendering.
    #[cfg(feature = "std")]
    pub fn build(self) -> Result<Engine> {
        let device = OutputDevice::open(self.output_device)?;
        let mut config = self.config;
        config.sample_rate = device.sample_rate();
        config.validate()?;

        let (render, link) = RenderEngine::new(&config);
        let stream = device.start(render)?;
        tracing::info!(
            device = stream.device_name(),
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "engine started"
        );

        let engine = Engine::from_parts(config, link);
        *engine.output.lock() = Some(stream);
        Ok(engine)
    }

    /// Build an engine without an audio device.
    ///
    /// The returned [`OfflineDriver`] renders blocks on demand; the engine is
    /// controlled exactly as a device-backed one.
    pub fn build_offline(self) -> Result<(Engine, OfflineDriver)> {
        self.config.validate()?;
        let (render, link) = RenderEngine::new(&self.config);
        tracing::debug!(
            sample_rate = self.config.sample_rate,
            block_size = self.config.block_size,
            "offline engine built"
        );
        Ok((Engine::from_parts(self.config, link), OfflineDriver::new(render)))
    }
}
