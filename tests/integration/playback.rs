//! Playback integration tests
//!
//! Tracks are loaded directly, then played through the full mix with unity
//! track gain and a muted metronome.

use crate::helpers::tolerances::{FLOAT_EPSILON, PERCEPTUAL_EPSILON};
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use tapedeck::prelude::*;

const START: u64 = 256;

fn load(engine: &Engine, track: usize, samples: &[f32]) {
    engine.track(track).unwrap().write_at(0, samples, samples);
}

/// Track whose sample at index `i` is `i`.
fn load_ramp(engine: &Engine, track: usize, frames: usize) {
    let ramp: Vec<f32> = (0..frames).map(|i| i as f32).collect();
    load(engine, track, &ramp);
}

/// Left output from frame 0 up to at least `START + frames`.
fn play_and_render(engine: &Engine, driver: &mut OfflineDriver, frames: u64) -> Vec<f32> {
    engine.play_at(START).unwrap();
    left(&driver.render_until(START + frames))
}

fn assert_follows(out: &[f32], expected: impl Fn(u64) -> f32) {
    for (frame, &sample) in out.iter().enumerate() {
        let want = if (frame as u64) < START {
            0.0
        } else {
            expected(frame as u64 - START)
        };
        assert_eq!(sample, want, "frame {frame}");
    }
}

#[test]
fn test_plays_recorded_extent_once() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);

    let out = play_and_render(&engine, &mut driver, 2_000);
    assert_follows(&out, |k| if k < 1_000 { k as f32 } else { 0.0 });
}

#[test]
fn test_loop_wraps_at_recorded_extent() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.set_loop(0, 0, 0, true).unwrap();

    let out = play_and_render(&engine, &mut driver, 3_500);
    assert_follows(&out, |k| (k % 1_000) as f32);
}

#[test]
fn test_loop_region() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.set_loop(0, 100, 200, true).unwrap();

    let out = play_and_render(&engine, &mut driver, 1_000);
    assert_follows(&out, |k| (100 + k % 200) as f32);
}

#[test]
fn test_non_looping_stops_at_loop_end() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.set_loop(0, 0, 300, false).unwrap();

    let out = play_and_render(&engine, &mut driver, 1_000);
    assert_follows(&out, |k| if k < 300 { k as f32 } else { 0.0 });
}

#[test]
fn test_latency_compensation_reads_ahead() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.set_latency_compensation(50).unwrap();
    assert_eq!(engine.latency_compensation(), 50);

    let out = play_and_render(&engine, &mut driver, 1_200);
    assert_follows(&out, |k| if k + 50 < 1_000 { (k + 50) as f32 } else { 0.0 });
}

#[test]
fn test_negative_latency_delays_playback() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.set_latency_compensation(-50).unwrap();

    let out = play_and_render(&engine, &mut driver, 1_200);
    assert_follows(&out, |k| if (50..1_050).contains(&k) { (k - 50) as f32 } else { 0.0 });
}

#[test]
fn test_enabling_loop_while_playing() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);

    engine.play_at(START).unwrap();
    let mut out = left(&driver.render_until(START + 500));
    engine.set_loop(0, 0, 0, true).unwrap();
    out.extend(left(&driver.render_until(START + 2_500)));

    assert_follows(&out, |k| (k % 1_000) as f32);
}

#[test]
fn test_tracks_are_summed() {
    let (engine, mut driver) = test_engine();
    load(&engine, 0, &[0.25; 2_000]);
    load(&engine, 5, &[0.5; 2_000]);

    let out = play_and_render(&engine, &mut driver, 1_000);
    assert_follows(&out, |_| 0.75);
}

#[test]
fn test_volume_change_ramps_to_target() {
    let (engine, mut driver) = test_engine();
    load(&engine, 0, &vec![1.0; 96_000]);
    engine.play_at(0).unwrap();

    let unity = left(&driver.render_blocks(1));
    assert!(unity.iter().all(|&s| s == 1.0));

    engine.set_volume(0, -6.0).unwrap();
    let out = left(&driver.render_until(48_000));

    // No step: the first ramped sample is still close to unity.
    assert!(out[0] > 0.99, "gain stepped to {}", out[0]);
    for pair in out.windows(2) {
        assert!(pair[1] <= pair[0] + FLOAT_EPSILON);
    }
    assert_abs_diff_eq!(*out.last().unwrap(), 0.501_187, epsilon = PERCEPTUAL_EPSILON);
}

#[test]
fn test_stop_silences_playback() {
    let (engine, mut driver) = test_engine();
    load(&engine, 0, &[1.0; 4_000]);
    engine.play_at(0).unwrap();
    assert_has_audio(&driver.render_blocks(4), 0.5);

    engine.stop().unwrap();
    assert_silence(&driver.render_blocks(4), 0.0);
}

#[test]
fn test_replay_restarts_from_loop_start() {
    let (engine, mut driver) = test_engine();
    load_ramp(&engine, 0, 1_000);
    engine.play_at(0).unwrap();
    driver.render_until(600);
    engine.stop().unwrap();

    let restart = driver.now() + 128;
    engine.play_at(restart).unwrap();
    let from = driver.now();
    let out = left(&driver.render_until(restart + 300));
    let at_restart = (restart - from) as usize;
    assert_eq!(out[at_restart], 0.0);
    assert_eq!(out[at_restart + 1], 1.0);
    assert_eq!(out[at_restart + 299], 299.0);
}
