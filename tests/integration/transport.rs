//! Transport integration tests
//!
//! Play/stop scheduling, published snapshots, events, tempo and meter.

use crate::helpers::*;
use approx::assert_abs_diff_eq;
use tapedeck::prelude::*;

#[test]
fn test_play_schedules_start_after_margin() {
    let (engine, mut driver) = test_engine();
    driver.render_blocks(10);

    engine.play().unwrap();

    let snapshot = engine.transport().snapshot();
    assert!(snapshot.playing);
    assert_eq!(snapshot.start_frame, Some(10 * TEST_BLOCK_SIZE as u64 + 2048));
}

#[test]
fn test_play_twice_is_noop() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();

    engine.play().unwrap();
    let first = engine.transport().snapshot().start_frame;
    driver.render_blocks(4);
    engine.play().unwrap();

    assert_eq!(engine.transport().snapshot().start_frame, first);
    let started = drain_events(&events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::TransportStarted { .. }))
        .count();
    assert_eq!(started, 1);
}

#[test]
fn test_play_at_explicit_frame() {
    let (engine, _driver) = test_engine();
    engine.play_at(96_000).unwrap();
    assert_eq!(engine.transport().snapshot().start_frame, Some(96_000));
}

#[test]
fn test_elapsed_time_follows_frame_clock() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();

    engine.play_at(0).unwrap();
    driver.render_until(24_000);
    engine.pump();

    assert_abs_diff_eq!(engine.elapsed_seconds(), 24_064.0 / TEST_SAMPLE_RATE, epsilon = 1e-9);
    let last_time = drain_events(&events)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::TimeUpdate { seconds } => Some(seconds),
            _ => None,
        })
        .last();
    assert_abs_diff_eq!(last_time.unwrap(), 24_064.0 / TEST_SAMPLE_RATE, epsilon = 1e-9);
}

#[test]
fn test_elapsed_time_is_zero_before_scheduled_start() {
    let (engine, mut driver) = test_engine();
    engine.play().unwrap();
    driver.render_blocks(2);
    assert_eq!(engine.elapsed_seconds(), 0.0);
}

#[test]
fn test_stop_clears_transport_and_emits_event() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    let reader = engine.transport();

    engine.play_at(0).unwrap();
    driver.render_blocks(8);
    engine.stop().unwrap();

    assert!(!engine.is_playing());
    assert!(!reader.is_playing());
    assert_eq!(reader.snapshot().start_frame, None);
    assert_eq!(engine.elapsed_seconds(), 0.0);

    let events = drain_events(&events);
    assert_eq!(events[0], EngineEvent::TransportStarted { start_frame: 0 });
    assert_eq!(
        events.last(),
        Some(&EngineEvent::TransportStopped { frame: 8 * TEST_BLOCK_SIZE as u64 })
    );
}

#[test]
fn test_stop_while_stopped_is_quiet() {
    let (engine, _driver) = test_engine();
    let events = engine.events();
    engine.stop().unwrap();
    assert!(drain_events(&events).is_empty());
}

#[test]
fn test_tempo_and_meter_are_published() {
    let (engine, _driver) = test_engine();
    let reader = engine.transport();

    engine.set_bpm(90.0).unwrap();
    engine.set_beats_per_measure(7).unwrap();

    let snapshot = reader.snapshot();
    assert_eq!(snapshot.bpm, 90.0);
    assert_eq!(snapshot.beats_per_measure, 7);
    assert_eq!(engine.bpm(), 90.0);
}

#[test]
fn test_tempo_survives_stop_and_play() {
    let (engine, mut driver) = test_engine();
    engine.set_bpm(140.0).unwrap();
    engine.play().unwrap();
    driver.render_blocks(4);
    engine.stop().unwrap();
    engine.play().unwrap();
    assert_eq!(engine.transport().bpm(), 140.0);
}

#[test]
fn test_reader_is_usable_from_other_thread() {
    let (engine, _driver) = test_engine();
    let reader = engine.transport();
    engine.play_at(512).unwrap();

    let start = std::thread::spawn(move || reader.snapshot().start_frame)
        .join()
        .unwrap();
    assert_eq!(start, Some(512));
}
