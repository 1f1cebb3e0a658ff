//! Engine controller: owns the track buffers, transport and recording
//! sessions, and drives the render domain through typed commands.

use crate::events::{EngineEvent, EventBus};
use crate::session::RecordingSession;
use crate::transport::{TransportReader, TransportSnapshot, TransportState};
use crate::{Error, Result};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::Arc;
use tapedeck_core::command::CommandSender;
use tapedeck_core::{
    db_to_linear, linear_to_db, units, BatchRecycler, BatchSource, ControlLink, EngineConfig,
    FrameClock, GainTarget, InputFeed, InputStatus, MetronomeUpdate, NotificationReceiver,
    NotificationSender, PlaybackParams, RecorderRenderer, RenderCommand, RenderNotification,
    TrackBuffer, MAX_OPEN_SESSIONS, MAX_RETIRED_INPUTS, TRACK_COUNT,
};
use tracing::{debug, info, warn};

#[cfg(feature = "std")]
use tapedeck_core::{OutputDevice, OutputDeviceInfo, OutputStream};
#[cfg(feature = "std")]
use tapedeck_input::{InputDeviceInfo, InputStream};

#[derive(Debug, Clone, Copy, Default)]
struct LoopSettings {
    loop_start: u64,
    loop_duration: u64,
    looping: bool,
}

/// The attached input source, as seen from the control side.
struct InputSource {
    status: Arc<InputStatus>,
    channels: usize,
    /// Present when the engine opened the device itself.
    #[cfg(feature = "std")]
    device: Option<OpenedInput>,
    lost_reported: bool,
}

impl InputSource {
    fn new(feed: &InputFeed) -> Self {
        Self {
            status: Arc::clone(feed.status()),
            channels: feed.channels(),
            #[cfg(feature = "std")]
            device: None,
            lost_reported: false,
        }
    }
}

#[cfg(feature = "std")]
struct OpenedInput {
    info: InputDeviceInfo,
    _stream: InputStream,
}

/// Everything the controller mutates, behind one lock.
struct ControlState {
    commands: CommandSender,
    notifications: NotificationReceiver,
    notifier: NotificationSender,
    pool: BatchSource,
    recycler: BatchRecycler,
    transport: Option<TransportState>,
    bpm: f64,
    beats_per_measure: u32,
    track_gain_db: [f32; TRACK_COUNT],
    metronome_gain_db: f32,
    loops: [LoopSettings; TRACK_COUNT],
    latency_frames: i64,
    /// Oldest first. A track can have finishing sessions ahead of a new
    /// active one. Never longer than `MAX_OPEN_SESSIONS`.
    sessions: Vec<RecordingSession>,
    input: Option<InputSource>,
    /// Replaced feeds the render domain has not handed back yet.
    retired_inputs: usize,
    #[cfg(feature = "std")]
    output_lost_reported: bool,
}

impl ControlState {
    fn is_recording(&self, track: usize) -> bool {
        self.sessions.iter().any(|s| s.track == track && !s.stopping)
    }

    /// True while the track is being captured or written back.
    fn has_session(&self, track: usize) -> bool {
        self.sessions.iter().any(|s| s.track == track)
    }

    fn params(&self, track: usize) -> PlaybackParams {
        let settings = self.loops[track];
        PlaybackParams {
            loop_start: settings.loop_start,
            loop_duration: settings.loop_duration,
            latency_frames: self.latency_frames,
        }
    }

    fn send(&mut self, command: RenderCommand) -> Result<()> {
        Ok(self.commands.send(command)?)
    }
}

/// Multi-track engine: metronome, sixteen playback tracks and recorders on
/// one frame clock.
///
/// Build with [`Engine::builder()`]. All methods take `&self`; the engine can
/// be shared between threads behind an `Arc`.
///
/// # Example
///
/// ```
/// use tapedeck::prelude::*;
///
/// let (engine, mut driver) = Engine::builder()
///     .bpm(100.0)
///     .max_track_seconds(1.0)
///     .build_offline()?;
///
/// engine.set_volume(0, -6.0)?;
/// engine.play()?;
/// driver.render_blocks(64);
/// engine.pump();
/// assert!(engine.is_playing());
/// # Ok::<(), tapedeck::Error>(())
/// ```
pub struct Engine {
    config: EngineConfig,
    clock: FrameClock,
    tracks: Box<[Arc<TrackBuffer>]>,
    state: Mutex<ControlState>,
    transport: TransportReader,
    events: EventBus,
    #[cfg(feature = "std")]
    pub(crate) output: Mutex<Option<OutputStream>>,
}

impl Engine {
    /// Create a new engine builder
    pub fn builder() -> crate::EngineBuilder {
        crate::EngineBuilder::default()
    }

    pub(crate) fn from_parts(config: EngineConfig, link: ControlLink) -> Self {
        let capacity = config.track_capacity();
        let tracks = (0..TRACK_COUNT)
            .map(|_| Arc::new(TrackBuffer::with_capacity(capacity)))
            .collect();

        let ControlLink {
            commands,
            notifications,
            notifier,
            clock,
            pool,
            recycler,
        } = link;

        let state = ControlState {
            commands,
            notifications,
            notifier,
            pool,
            recycler,
            transport: None,
            bpm: config.default_bpm,
            beats_per_measure: config.default_beats_per_measure,
            track_gain_db: [linear_to_db(config.default_track_gain); TRACK_COUNT],
            metronome_gain_db: linear_to_db(config.default_metronome_gain),
            loops: [LoopSettings::default(); TRACK_COUNT],
            latency_frames: 0,
            sessions: Vec::with_capacity(MAX_OPEN_SESSIONS),
            input: None,
            retired_inputs: 0,
            #[cfg(feature = "std")]
            output_lost_reported: false,
        };

        Self {
            transport: TransportReader::new(config.default_bpm, config.default_beats_per_measure),
            config,
            clock,
            tracks,
            state: Mutex::new(state),
            events: EventBus::new(),
            #[cfg(feature = "std")]
            output: Mutex::new(None),
        }
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Start the transport a scheduling margin after the current frame.
    ///
    /// No-op if already playing.
    pub fn play(&self) -> Result<()> {
        let mut guard = self.state.lock();
        self.start_transport(&mut guard, None).map(|_| ())
    }

    /// Start the transport at an explicit absolute frame.
    ///
    /// No-op if already playing.
    pub fn play_at(&self, start_frame: u64) -> Result<()> {
        let mut guard = self.state.lock();
        self.start_transport(&mut guard, Some(start_frame)).map(|_| ())
    }

    fn start_transport(&self, state: &mut ControlState, start_frame: Option<u64>) -> Result<u64> {
        if let Some(transport) = state.transport {
            return Ok(transport.start_frame);
        }

        let start = start_frame
            .unwrap_or_else(|| self.clock.now() + self.config.scheduling_margin_frames);

        state.send(RenderCommand::Metronome(MetronomeUpdate {
            bpm: Some(state.bpm),
            beats_per_measure: Some(state.beats_per_measure),
            start_frame: Some(start),
        }))?;

        // Tracks with a session get their playback from `finish_session`.
        for (track, buffer) in self.tracks.iter().enumerate() {
            if !buffer.has_audio() || state.has_session(track) {
                continue;
            }
            state.send(RenderCommand::SetBuffers {
                track,
                buffer: Arc::clone(buffer),
            })?;
            state.send(RenderCommand::StartPlayback {
                track,
                start_frame: start,
                looping: state.loops[track].looping,
            })?;
        }

        state.transport = Some(TransportState { start_frame: start });
        self.publish_transport(state);
        self.events.emit(EngineEvent::TransportStarted { start_frame: start });
        info!(start_frame = start, bpm = state.bpm, "transport started");
        Ok(start)
    }

    /// Stop every renderer and finalize all recording sessions.
    ///
    /// Each session completes asynchronously: its last batches are written
    /// back by [`pump`](Self::pump), which then emits
    /// [`EngineEvent::TrackRecorded`].
    pub fn stop(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.drain_notifications(state);

        state.send(RenderCommand::StopMetronome)?;
        for track in 0..TRACK_COUNT {
            state.send(RenderCommand::StopPlayback { track })?;
        }
        for session in state.sessions.iter_mut().filter(|s| !s.stopping) {
            session.stopping = true;
            state
                .commands
                .send(RenderCommand::StopRecorder {
                    track: session.track,
                })?;
            debug!(track = session.track, "recording stop requested");
        }

        if state.transport.take().is_some() {
            self.publish_transport(state);
            let frame = self.clock.now();
            self.events.emit(EngineEvent::TransportStopped { frame });
            info!(frame, "transport stopped");
        }
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().transport.is_some()
    }

    /// Seconds since the transport start, or zero while stopped or before the
    /// scheduled start is reached.
    pub fn elapsed_seconds(&self) -> f64 {
        self.state
            .lock()
            .transport
            .map(|t| self.clock.seconds_since(t.start_frame).max(0.0))
            .unwrap_or(0.0)
    }

    /// Lock-free transport reader for other threads.
    pub fn transport(&self) -> TransportReader {
        self.transport.clone()
    }

    fn publish_transport(&self, state: &ControlState) {
        self.transport.publish(TransportSnapshot {
            playing: state.transport.is_some(),
            start_frame: state.transport.map(|t| t.start_frame),
            bpm: state.bpm,
            beats_per_measure: state.beats_per_measure,
        });
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Arm `track` and start capturing from the attached input.
    ///
    /// Starts the transport first if needed. No-op if the track is already
    /// recording.
    ///
    /// Fails with [`Error::Busy`] while `MAX_OPEN_SESSIONS` sessions are
    /// still waiting for the render domain to confirm their stop.
    pub fn record(&self, track: usize) -> Result<()> {
        self.check_track(track)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.drain_notifications(state);

        match state.input.as_ref() {
            None => return Err(Error::NoInputSource),
            Some(input) if input.status.is_lost() => return Err(Error::InputLost),
            Some(_) => {}
        }
        if state.is_recording(track) {
            return Ok(());
        }
        if state.sessions.len() >= MAX_OPEN_SESSIONS {
            warn!(track, open = state.sessions.len(), "too many recordings still finishing");
            return Err(Error::Busy);
        }

        let anchor = self.start_transport(state, None)?;
        state.send(RenderCommand::StopPlayback { track })?;
        let recorder = RecorderRenderer::new(track, state.pool.clone(), state.notifier.clone());
        state.send(RenderCommand::AttachRecorder(recorder))?;
        state.sessions.push(RecordingSession::new(track, anchor));

        info!(track, anchor_frame = anchor, "recording started");
        Ok(())
    }

    pub fn is_recording(&self, track: usize) -> bool {
        self.state.lock().is_recording(track)
    }

    // =========================================================================
    // Control-domain service
    // =========================================================================

    /// Service routine for the control domain. Call it regularly (every UI
    /// frame is plenty).
    ///
    /// Writes captured batches back into their tracks, finalizes stopped
    /// sessions and releases retired input feeds. Then reports a lost input
    /// or output and publishes a [`EngineEvent::TimeUpdate`] while playing.
    pub fn pump(&self) {
        #[cfg(feature = "std")]
        let output_failed = self
            .output
            .lock()
            .as_ref()
            .is_some_and(OutputStream::has_failed);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.drain_notifications(state);

        if let Some(input) = state.input.as_mut() {
            if input.status.is_lost() && !input.lost_reported {
                input.lost_reported = true;
                warn!("input source lost");
                self.events.emit(EngineEvent::InputLost);
            }
        }

        #[cfg(feature = "std")]
        if output_failed && !state.output_lost_reported {
            state.output_lost_reported = true;
            warn!("output stream failed");
            self.events.emit(EngineEvent::OutputLost);
        }

        if let Some(transport) = state.transport {
            let seconds = self.clock.seconds_since(transport.start_frame).max(0.0);
            self.events.emit(EngineEvent::TimeUpdate { seconds });
        }
    }

    /// Handle everything the render domain has posted so far.
    fn drain_notifications(&self, state: &mut ControlState) {
        while let Some(notification) = state.notifications.try_recv() {
            match notification {
                RenderNotification::Batch(batch) => {
                    let track = batch.track();
                    let session = state.sessions.iter_mut().find(|s| s.track == track);
                    match (session, self.tracks.get(track)) {
                        (Some(session), Some(buffer)) => {
                            if !session.integrate(&batch, buffer) {
                                warn!(track, sequence = batch.sequence(), "capture batch out of order");
                            }
                        }
                        _ => debug!(track, "capture batch without a session, discarding"),
                    }
                    state.recycler.recycle(batch);
                }
                RenderNotification::RecorderStopped {
                    track,
                    dropped_frames,
                } => self.finish_session(state, track, dropped_frames),
                RenderNotification::InputRetired(feed) => {
                    state.retired_inputs = state.retired_inputs.saturating_sub(1);
                    debug!(channels = feed.channels(), "input feed retired");
                    drop(feed);
                }
            }
        }
    }

    fn finish_session(&self, state: &mut ControlState, track: usize, dropped_frames: u64) {
        let Some(index) = state.sessions.iter().position(|s| s.track == track) else {
            debug!(track, "stop marker without a session");
            return;
        };
        let session = state.sessions.remove(index);

        if dropped_frames > 0 {
            warn!(track, dropped_frames, "recorder overrun, batch pool exhausted");
            self.events.emit(EngineEvent::RecorderOverrun {
                track,
                dropped_frames,
            });
        }
        if session.frames_clipped > 0 {
            debug!(track, frames = session.frames_clipped, "captured audio outside track capacity");
        }

        if let Some(buffer) = self.tracks.get(track) {
            let mut handoff = state.send(RenderCommand::SetBuffers {
                track,
                buffer: Arc::clone(buffer),
            });
            // The transport may have started while the take was finishing.
            if let Some(transport) = state.transport {
                if handoff.is_ok() && buffer.has_audio() && !state.has_session(track) {
                    handoff = state.send(RenderCommand::StartPlayback {
                        track,
                        start_frame: transport.start_frame,
                        looping: state.loops[track].looping,
                    });
                }
            }
            if let Err(err) = handoff {
                warn!(track, %err, "could not hand recorded buffer to playback");
            }
        }

        info!(track, frames = session.frames_written, "recording finalized");
        self.events.emit(EngineEvent::TrackRecorded {
            track,
            frames_written: session.frames_written,
            frames_clipped: session.frames_clipped,
        });
    }

    /// Engine events. Intended for a single consumer.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events.receiver()
    }

    // =========================================================================
    // Gain
    // =========================================================================

    /// Set a track's gain in dB. The change is smoothed, never stepped.
    pub fn set_volume(&self, track: usize, db: f32) -> Result<()> {
        self.check_track(track)?;
        let mut state = self.state.lock();
        state.send(RenderCommand::SetGain {
            target: GainTarget::Track(track),
            value: db_to_linear(db),
            time_constant: self.config.gain_time_constant,
        })?;
        state.track_gain_db[track] = db;
        debug!(track, db, "track gain");
        Ok(())
    }

    pub fn set_metronome_volume(&self, db: f32) -> Result<()> {
        let mut state = self.state.lock();
        state.send(RenderCommand::SetGain {
            target: GainTarget::Metronome,
            value: db_to_linear(db),
            time_constant: self.config.gain_time_constant,
        })?;
        state.metronome_gain_db = db;
        debug!(db, "metronome gain");
        Ok(())
    }

    pub fn track_gain_db(&self, track: usize) -> Result<f32> {
        self.check_track(track)?;
        Ok(self.state.lock().track_gain_db[track])
    }

    pub fn metronome_volume_db(&self) -> f32 {
        self.state.lock().metronome_gain_db
    }

    // =========================================================================
    // Tempo & meter
    // =========================================================================

    /// Change the tempo. The metronome keeps its phase: the already scheduled
    /// beat stays where it is and later beats follow the new tempo.
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        units::validate_bpm(bpm)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.send(RenderCommand::Metronome(MetronomeUpdate {
            bpm: Some(bpm),
            ..Default::default()
        }))?;
        state.bpm = bpm;
        self.publish_transport(state);
        info!(bpm, "tempo changed");
        Ok(())
    }

    pub fn set_beats_per_measure(&self, beats: u32) -> Result<()> {
        if beats == 0 {
            return Err(tapedeck_core::Error::InvalidMeter(beats).into());
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.send(RenderCommand::Metronome(MetronomeUpdate {
            beats_per_measure: Some(beats),
            ..Default::default()
        }))?;
        state.beats_per_measure = beats;
        self.publish_transport(state);
        info!(beats, "meter changed");
        Ok(())
    }

    /// Re-derive the metronome phase from the transport start frame.
    pub fn resync_metronome(&self) -> Result<()> {
        let mut state = self.state.lock();
        let Some(transport) = state.transport else {
            return Ok(());
        };
        let update = MetronomeUpdate {
            bpm: Some(state.bpm),
            beats_per_measure: Some(state.beats_per_measure),
            start_frame: Some(transport.start_frame),
        };
        state.send(RenderCommand::Metronome(update))?;
        debug!(start_frame = transport.start_frame, "metronome resynchronized");
        Ok(())
    }

    pub fn bpm(&self) -> f64 {
        self.state.lock().bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.state.lock().beats_per_measure
    }

    // =========================================================================
    // Playback parameters
    // =========================================================================

    /// Set a track's loop region, in frames. A zero duration loops the whole
    /// recorded extent after `loop_start`.
    ///
    /// A track that is already playing switches seamlessly: its output only
    /// depends on the frame and the transport start.
    pub fn set_loop(
        &self,
        track: usize,
        loop_start: u64,
        loop_duration: u64,
        looping: bool,
    ) -> Result<()> {
        self.check_track(track)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.loops[track] = LoopSettings {
            loop_start,
            loop_duration,
            looping,
        };
        let params = state.params(track);
        state.send(RenderCommand::SetPlaybackParams { track, params })?;

        if let Some(transport) = state.transport {
            if self.tracks[track].has_audio() && !state.has_session(track) {
                state.send(RenderCommand::StartPlayback {
                    track,
                    start_frame: transport.start_frame,
                    looping,
                })?;
            }
        }
        Ok(())
    }

    /// Offset added to every playback read position, in frames. Positive
    /// values read ahead to cancel round-trip latency.
    pub fn set_latency_compensation(&self, frames: i64) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.latency_frames = frames;
        for track in 0..TRACK_COUNT {
            let params = state.params(track);
            state.send(RenderCommand::SetPlaybackParams { track, params })?;
        }
        debug!(frames, "latency compensation");
        Ok(())
    }

    pub fn latency_compensation(&self) -> i64 {
        self.state.lock().latency_frames
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Attach an input feed. Replaces (and closes) any previous source.
    ///
    /// Fails with [`Error::Busy`] while `MAX_RETIRED_INPUTS` replaced feeds
    /// are still on their way back from the render domain.
    pub fn attach_input(&self, feed: InputFeed) -> Result<()> {
        let source = InputSource::new(&feed);
        self.install_input(feed, source)
    }

    /// Open an input device (the host default when `None`) and attach it.
    #[cfg(feature = "std")]
    pub fn open_input(&self, device: Option<usize>) -> Result<InputDeviceInfo> {
        let (stream, feed) = InputStream::open(
            device,
            self.config.input_buffer_seconds,
            self.config.block_size,
        )?;
        if f64::from(stream.sample_rate()) != self.config.sample_rate {
            warn!(
                input_rate = stream.sample_rate(),
                engine_rate = self.config.sample_rate,
                "input sample rate differs from engine rate"
            );
        }
        let info = stream.info().clone();
        let mut source = InputSource::new(&feed);
        source.device = Some(OpenedInput {
            info: info.clone(),
            _stream: stream,
        });
        self.install_input(feed, source)?;
        Ok(info)
    }

    fn install_input(&self, feed: InputFeed, source: InputSource) -> Result<()> {
        let channels = source.channels;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.drain_notifications(state);

        let replaces = state.input.is_some();
        if replaces && state.retired_inputs >= MAX_RETIRED_INPUTS {
            return Err(Error::Busy);
        }
        state.send(RenderCommand::AttachInput(feed))?;
        if replaces {
            state.retired_inputs += 1;
        }
        state.input = Some(source);
        info!(channels, "input attached");
        Ok(())
    }

    /// Detach the input source. Active recorders capture silence until a new
    /// source is attached.
    pub fn detach_input(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.drain_notifications(state);

        if state.input.is_none() {
            return Ok(());
        }
        if state.retired_inputs >= MAX_RETIRED_INPUTS {
            return Err(Error::Busy);
        }
        state.send(RenderCommand::DetachInput)?;
        state.retired_inputs += 1;
        state.input = None;
        info!("input detached");
        Ok(())
    }

    pub fn has_input(&self) -> bool {
        self.state.lock().input.is_some()
    }

    /// Device info of the attached input, if it was opened by the engine.
    #[cfg(feature = "std")]
    pub fn input_info(&self) -> Option<InputDeviceInfo> {
        self.state
            .lock()
            .input
            .as_ref()
            .and_then(|i| i.device.as_ref())
            .map(|d| d.info.clone())
    }

    pub fn input_channels(&self) -> Option<usize> {
        self.state.lock().input.as_ref().map(|i| i.channels)
    }

    /// Peak input level since the last call.
    pub fn input_peak(&self) -> f32 {
        self.state
            .lock()
            .input
            .as_ref()
            .map(|i| i.status.take_peak())
            .unwrap_or(0.0)
    }

    #[cfg(feature = "std")]
    pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>> {
        Ok(tapedeck_input::list_input_devices()?)
    }

    // =========================================================================
    // Devices & tracks
    // =========================================================================

    #[cfg(feature = "std")]
    pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>> {
        Ok(tapedeck_core::list_output_devices()?)
    }

    /// Name of the output device, `None` for an offline engine.
    #[cfg(feature = "std")]
    pub fn output_device_name(&self) -> Option<String> {
        self.output
            .lock()
            .as_ref()
            .map(|stream| stream.device_name().to_string())
    }

    /// Move rendering to another output device, the host default when `None`.
    ///
    /// The device is opened at the engine's sample rate. Audio keeps playing
    /// on the current device if the new one cannot be started. Returns the
    /// new device name.
    #[cfg(feature = "std")]
    pub fn set_output_device(&self, index: Option<usize>) -> Result<String> {
        let name = {
            let mut output = self.output.lock();
            let stream = output.as_mut().ok_or(Error::NoOutputDevice)?;
            let device = OutputDevice::open_at_rate(index, self.config.sample_rate.round() as u32)?;
            stream.switch_device(device)?;
            stream.device_name().to_string()
        };
        self.state.lock().output_lost_reported = false;
        info!(device = %name, "output device changed");
        Ok(name)
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Absolute frame of the next render block.
    pub fn current_frame(&self) -> u64 {
        self.clock.now()
    }

    pub fn clock(&self) -> FrameClock {
        self.clock.clone()
    }

    pub fn track(&self, track: usize) -> Result<Arc<TrackBuffer>> {
        self.check_track(track)?;
        Ok(Arc::clone(&self.tracks[track]))
    }

    /// Copy of a track's recorded extent.
    pub fn track_samples(&self, track: usize) -> Result<(Vec<f32>, Vec<f32>)> {
        self.check_track(track)?;
        Ok(self.tracks[track].to_vecs())
    }

    fn check_track(&self, track: usize) -> Result<()> {
        if track >= TRACK_COUNT {
            return Err(tapedeck_core::Error::InvalidTrack {
                index: track,
                count: TRACK_COUNT,
            }
            .into());
        }
        Ok(())
    }
}
