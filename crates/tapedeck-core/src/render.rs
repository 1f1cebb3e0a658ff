//! The render engine: one fixed-size block per call, fanned out to every
//! renderer against a single frame clock.
//!
//! Order of work per block:
//!
//! 1. Drain the command ring and apply every pending command.
//! 2. Pull one block from the input feed (silence if none is attached).
//! 3. Metronome and each playback track render into scratch, pass through
//!    their smoothed gain stage and are summed into the mix.
//! 4. Armed recorders capture the input block.
//! 5. The mix is interleaved into the output and the clock advances.
//!
//! Nothing here allocates, locks or logs.

use crate::batch::{batch_pool, BatchRecycler, BatchSource};
use crate::clock::{ClockDriver, FrameClock};
use crate::command::{
    command_queue, notification_channel, CommandReceiver, CommandSender, GainTarget,
    NotificationReceiver, NotificationSender, RenderCommand, RenderNotification,
};
use crate::config::{EngineConfig, TRACK_COUNT};
use crate::input::InputFeed;
use crate::metronome::MetronomeRenderer;
use crate::playback::PlaybackRenderer;
use crate::recorder::RecorderRenderer;
use crate::smooth::SmoothedValue;

/// Control-side ends of every channel into the render engine.
pub struct ControlLink {
    pub commands: CommandSender,
    pub notifications: NotificationReceiver,
    /// Cloned into each recorder.
    pub notifier: NotificationSender,
    pub clock: FrameClock,
    /// Cloned into each recorder.
    pub pool: BatchSource,
    pub recycler: BatchRecycler,
}

struct TrackSlot {
    playback: PlaybackRenderer,
    gain: SmoothedValue,
    recorder: Option<RecorderRenderer>,
}

pub struct RenderEngine {
    block_size: usize,
    commands: CommandReceiver,
    notify: NotificationSender,
    clock: ClockDriver,
    metronome: MetronomeRenderer,
    metronome_gain: SmoothedValue,
    tracks: Box<[TrackSlot]>,
    input: Option<InputFeed>,
    input_left: Box<[f32]>,
    input_right: Box<[f32]>,
    scratch_left: Box<[f32]>,
    scratch_right: Box<[f32]>,
    mix_left: Box<[f32]>,
    mix_right: Box<[f32]>,
}

impl RenderEngine {
    /// Build the render engine and the control-side link for `config`.
    ///
    /// All render-side memory (scratch blocks, batch pool, queues) is
    /// allocated here.
    pub fn new(config: &EngineConfig) -> (RenderEngine, ControlLink) {
        let block = config.block_size;
        let sample_rate = config.sample_rate as f32;
        let (commands_tx, commands_rx) = command_queue(config.command_queue_capacity);
        let (notifier, notifications) = notification_channel(config.notification_capacity());
        let (clock, driver) = FrameClock::new(config.sample_rate);
        let (pool, recycler) = batch_pool(config.batch_pool_size, config.batch_frames());

        let tracks = (0..TRACK_COUNT)
            .map(|_| TrackSlot {
                playback: PlaybackRenderer::new(),
                gain: SmoothedValue::new(
                    config.default_track_gain,
                    config.gain_time_constant,
                    sample_rate,
                ),
                recorder: None,
            })
            .collect();

        let zeros = || vec![0.0f32; block].into_boxed_slice();
        let engine = RenderEngine {
            block_size: block,
            commands: commands_rx,
            notify: notifier.clone(),
            clock: driver,
            metronome: MetronomeRenderer::new(
                config.sample_rate,
                config.default_bpm,
                config.default_beats_per_measure,
                config.beep_frames(),
            ),
            metronome_gain: SmoothedValue::new(
                config.default_metronome_gain,
                config.gain_time_constant,
                sample_rate,
            ),
            tracks,
            input: None,
            input_left: zeros(),
            input_right: zeros(),
            scratch_left: zeros(),
            scratch_right: zeros(),
            mix_left: zeros(),
            mix_right: zeros(),
        };

        let link = ControlLink {
            commands: commands_tx,
            notifications,
            notifier,
            clock,
            pool,
            recycler,
        };
        (engine, link)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Absolute frame of the next block.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Render exactly one block into `output`, interleaved stereo
    /// (`2 * block_size` samples).
    pub fn process_block(&mut self, output: &mut [f32]) {
        self.apply_commands();

        let block_start = self.clock.now();

        match self.input.as_mut() {
            Some(feed) => feed.read_block(&mut self.input_left, &mut self.input_right),
            None => {
                self.input_left.fill(0.0);
                self.input_right.fill(0.0);
            }
        }

        self.metronome
            .render(block_start, &mut self.mix_left, &mut self.mix_right);
        self.metronome_gain
            .apply_gain_stereo(&mut self.mix_left, &mut self.mix_right);

        for slot in self.tracks.iter_mut() {
            slot.playback
                .render(block_start, &mut self.scratch_left, &mut self.scratch_right);
            slot.gain
                .apply_gain_stereo(&mut self.scratch_left, &mut self.scratch_right);
            mix_into(&mut self.mix_left, &self.scratch_left);
            mix_into(&mut self.mix_right, &self.scratch_right);

            if let Some(recorder) = slot.recorder.as_mut() {
                recorder.capture(block_start, &self.input_left, &self.input_right);
            }
        }

        for (i, frame) in output.chunks_exact_mut(2).take(self.block_size).enumerate() {
            frame[0] = self.mix_left[i];
            frame[1] = self.mix_right[i];
        }

        self.clock.advance(self.block_size);
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::Metronome(update) => self.metronome.update(update),
            RenderCommand::StopMetronome => self.metronome.stop(),
            RenderCommand::SetBuffers { track, buffer } => {
                if let Some(slot) = self.tracks.get_mut(track) {
                    slot.playback.set_buffer(buffer);
                }
            }
            RenderCommand::StartPlayback {
                track,
                start_frame,
                looping,
            } => {
                if let Some(slot) = self.tracks.get_mut(track) {
                    slot.playback.start(start_frame, looping);
                }
            }
            RenderCommand::StopPlayback { track } => {
                if let Some(slot) = self.tracks.get_mut(track) {
                    slot.playback.stop();
                }
            }
            RenderCommand::SetPlaybackParams { track, params } => {
                if let Some(slot) = self.tracks.get_mut(track) {
                    slot.playback.set_params(params);
                }
            }
            RenderCommand::SetGain {
                target,
                value,
                time_constant,
            } => {
                let gain = match target {
                    GainTarget::Metronome => Some(&mut self.metronome_gain),
                    GainTarget::Track(track) => self.tracks.get_mut(track).map(|s| &mut s.gain),
                };
                if let Some(gain) = gain {
                    gain.set_target_with(value, time_constant);
                }
            }
            RenderCommand::AttachRecorder(recorder) => match self.tracks.get_mut(recorder.track()) {
                Some(slot) => {
                    if let Some(previous) = slot.recorder.replace(recorder) {
                        previous.finish();
                    }
                }
                None => recorder.finish(),
            },
            RenderCommand::StopRecorder { track } => {
                if let Some(recorder) = self.tracks.get_mut(track).and_then(|s| s.recorder.take()) {
                    recorder.finish();
                }
            }
            RenderCommand::AttachInput(feed) => {
                if let Some(previous) = self.input.replace(feed) {
                    self.retire_input(previous);
                }
            }
            RenderCommand::DetachInput => {
                if let Some(previous) = self.input.take() {
                    self.retire_input(previous);
                }
            }
        }
    }

    /// Send a feed back to the control domain so its ring is freed there.
    ///
    /// The controller bounds pending retirements to
    /// [`MAX_RETIRED_INPUTS`](crate::config::MAX_RETIRED_INPUTS), which the
    /// channel reserves room for.
    fn retire_input(&self, feed: InputFeed) {
        let _ = self.notify.post(RenderNotification::InputRetired(feed));
    }
}

#[inline]
fn mix_into(mix: &mut [f32], source: &[f32]) {
    for (m, s) in mix.iter_mut().zip(source.iter()) {
        *m += s;
    }
}
