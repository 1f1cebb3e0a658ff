//! Test helpers and fixtures for tapedeck integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): DSP processing (oscillators, gain ramps)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]


use std::sync::Arc;
use tapedeck::core::{input_channel, InputStatus};
use tapedeck::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Render block size for deterministic testing
pub const TEST_BLOCK_SIZE: usize = 128;

/// Builder with test defaults: 48 kHz, 128-frame blocks, 2 s tracks, unity
/// track gain and a muted metronome.
pub fn test_builder() -> EngineBuilder {
    init_tracing();
    Engine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .block_size(TEST_BLOCK_SIZE)
        .max_track_seconds(2.0)
        .track_gain(1.0)
        .metronome_gain(0.0)
}

/// Route engine logs to the test harness output. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Offline engine with test defaults.
/// Avoids hardware audio I/O for CI environments.
pub fn test_engine() -> (Engine, OfflineDriver) {
    test_builder()
        .build_offline()
        .expect("Failed to create test engine")
}

/// Attach an input channel whose writer end is kept by `driver`.
///
/// Feed it with [`OfflineDriver::render_with_input`].
pub fn attach_test_input(
    engine: &Engine,
    driver: &mut OfflineDriver,
    channels: usize,
) -> Arc<InputStatus> {
    let (writer, feed) = input_channel(channels, TEST_SAMPLE_RATE as usize, driver.block_size());
    let status = Arc::clone(writer.status());
    driver.set_input_writer(writer);
    engine.attach_input(feed).expect("Failed to attach input");
    status
}

/// Input block where every sample equals its absolute frame number.
///
/// A recorded track then holds `anchor + i` at index `i`, which makes any
/// misalignment visible as an exact value mismatch.
pub fn frame_stamps(frame: u64, channels: usize, block: usize) -> Vec<f32> {
    (0..block)
        .flat_map(|i| std::iter::repeat((frame + i as u64) as f32).take(channels))
        .collect()
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Left channel of interleaved stereo.
pub fn left(interleaved: &[f32]) -> Vec<f32> {
    interleaved.iter().step_by(2).copied().collect()
}

/// Right channel of interleaved stereo.
pub fn right(interleaved: &[f32]) -> Vec<f32> {
    interleaved.iter().skip(1).step_by(2).copied().collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Collect every event currently queued.
pub fn drain_events(events: &crossbeam_channel::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    events.try_iter().collect()
}

/// Record `blocks` blocks of frame-stamped input on `track`, stop, and
/// service the engine until the take is written back.
///
/// Returns the session anchor (the transport start frame).
pub fn record_take(engine: &Engine, driver: &mut OfflineDriver, track: usize, blocks: usize) -> u64 {
    engine.record(track).expect("record");
    let anchor = engine
        .transport()
        .snapshot()
        .start_frame
        .expect("transport started");
    let block = driver.block_size();
    for i in 0..blocks {
        driver.render_with_input(1, |frame, channels| frame_stamps(frame, channels, block));
        if i % 16 == 15 {
            engine.pump();
        }
    }
    engine.stop().expect("stop");
    driver.render_with_input(1, |frame, channels| frame_stamps(frame, channels, block));
    engine.pump();
    anchor
}
