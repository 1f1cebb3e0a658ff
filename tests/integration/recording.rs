//! Recording integration tests
//!
//! Input is frame-stamped: every captured sample equals the absolute frame it
//! was captured at, so write-back alignment can be checked exactly.

use crate::helpers::*;
use proptest::prelude::*;
use tapedeck::core::{input_channel, MAX_OPEN_SESSIONS, MAX_RETIRED_INPUTS};
use tapedeck::prelude::*;
use tapedeck::Error;

fn assert_aligned(samples: &[f32], anchor: u64, from: usize) {
    for (i, &sample) in samples.iter().enumerate().skip(from) {
        assert_eq!(sample, (anchor + i as u64) as f32, "index {i}");
    }
}

fn recorded_event(events: &[EngineEvent], track: usize) -> Option<(usize, usize)> {
    events.iter().find_map(|e| match *e {
        EngineEvent::TrackRecorded {
            track: t,
            frames_written,
            frames_clipped,
        } if t == track => Some((frames_written, frames_clipped)),
        _ => None,
    })
}

#[test]
fn test_record_requires_input() {
    let (engine, _driver) = test_engine();
    assert!(matches!(engine.record(0), Err(Error::NoInputSource)));
    assert!(!engine.is_playing());
}

#[test]
fn test_record_after_detach_requires_input() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);
    engine.detach_input().unwrap();
    driver.render_blocks(1);
    engine.pump();

    assert!(!engine.has_input());
    assert!(matches!(engine.record(0), Err(Error::NoInputSource)));
}

#[test]
fn test_take_is_aligned_to_transport_start() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);

    let anchor = record_take(&engine, &mut driver, 0, 200);
    assert_eq!(anchor, 2048);

    let (left, right) = engine.track_samples(0).unwrap();
    assert_eq!(left.len(), 200 * TEST_BLOCK_SIZE - 2048);
    assert_aligned(&left, anchor, 0);
    assert_eq!(left, right);

    let events = drain_events(&events);
    assert_eq!(recorded_event(&events, 0), Some((200 * TEST_BLOCK_SIZE - 2048, 2048)));
}

#[test]
fn test_recording_state_transitions() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);

    engine.record(3).unwrap();
    assert!(engine.is_recording(3));
    assert!(!engine.is_recording(2));
    assert!(engine.is_playing());

    engine.stop().unwrap();
    assert!(!engine.is_recording(3));
    assert!(!engine.is_playing());
}

#[test]
fn test_record_twice_is_noop() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);

    engine.record(0).unwrap();
    driver.render_blocks(4);
    engine.record(0).unwrap();
    driver.render_blocks(4);
    engine.stop().unwrap();
    driver.render_blocks(1);
    engine.pump();

    let recorded = drain_events(&events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::TrackRecorded { .. }))
        .count();
    assert_eq!(recorded, 1);
}

fn recorded_count(events: &[EngineEvent], track: usize) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::TrackRecorded { track: t, .. } if *t == track))
        .count()
}

#[test]
fn test_repeated_takes_without_pump_are_all_finalized() {
    const TAKES: usize = 60;
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);
    let block = driver.block_size();
    let stamps = |frame, channels| frame_stamps(frame, channels, block);

    for _ in 0..TAKES {
        engine.record(0).unwrap();
        driver.render_with_input(2, stamps);
        engine.stop().unwrap();
        driver.render_with_input(1, stamps);
    }
    engine.pump();
    assert_eq!(recorded_count(&drain_events(&events), 0), TAKES);

    let anchor = record_take(&engine, &mut driver, 0, 40);
    let (left, _) = engine.track_samples(0).unwrap();
    assert_eq!(left.len(), 40 * TEST_BLOCK_SIZE - 2048);
    assert_aligned(&left, anchor, 0);
    assert_eq!(recorded_count(&drain_events(&events), 0), 1);
}

#[test]
fn test_record_is_refused_while_too_many_takes_finish() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);

    // Nothing renders, so no stop is confirmed.
    for _ in 0..MAX_OPEN_SESSIONS {
        engine.record(0).unwrap();
        engine.stop().unwrap();
    }
    assert!(matches!(engine.record(0), Err(Error::Busy)));
    assert!(!engine.is_recording(0));

    driver.render_blocks(1);
    engine.record(0).unwrap();
    assert!(engine.is_recording(0));
    assert_eq!(recorded_count(&drain_events(&events), 0), MAX_OPEN_SESSIONS);
}

#[test]
fn test_play_before_write_back_starts_take_aligned() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);
    let block = driver.block_size();
    let stamps = |frame, channels| frame_stamps(frame, channels, block);

    engine.record(0).unwrap();
    let anchor = engine.transport().snapshot().start_frame.unwrap();
    driver.render_with_input(40, stamps);
    let recorded = 40 * TEST_BLOCK_SIZE - anchor as usize;

    // The take is still owed its last batches when the transport restarts.
    engine.stop().unwrap();
    engine.play().unwrap();
    let start = engine.transport().snapshot().start_frame.unwrap();
    let from = driver.now();

    let mut out = left(&driver.render_with_input(1, stamps));
    engine.pump();
    out.extend(left(&driver.render_until(start + recorded as u64 + 256)));

    let offset = (start - from) as usize;
    assert_silence(&out[..offset], 0.0);
    assert_aligned(&out[offset..offset + recorded], anchor, 0);
    assert_silence(&out[offset + recorded..], 0.0);
}

#[test]
fn test_input_swaps_wait_for_retired_feeds() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);

    let mut writers = Vec::new();
    for _ in 0..MAX_RETIRED_INPUTS {
        let (writer, feed) = input_channel(1, 1024, TEST_BLOCK_SIZE);
        writers.push(writer);
        engine.attach_input(feed).unwrap();
    }
    let (_writer, feed) = input_channel(1, 1024, TEST_BLOCK_SIZE);
    assert!(matches!(engine.attach_input(feed), Err(Error::Busy)));
    assert!(matches!(engine.detach_input(), Err(Error::Busy)));
    assert!(engine.has_input());

    driver.render_blocks(1);
    engine.detach_input().unwrap();
    assert!(!engine.has_input());
}

#[test]
fn test_write_back_drops_past_capacity() {
    let (engine, mut driver) = test_builder()
        .max_track_seconds(100.0 / TEST_SAMPLE_RATE)
        .build_offline()
        .unwrap();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);

    let anchor = record_take(&engine, &mut driver, 0, 40);

    let buffer = engine.track(0).unwrap();
    assert_eq!(buffer.capacity(), 100);
    assert_eq!(buffer.recorded_frames(), 100);

    let (left, _) = engine.track_samples(0).unwrap();
    assert_aligned(&left, anchor, 0);

    let events = drain_events(&events);
    assert_eq!(recorded_event(&events, 0), Some((100, 40 * TEST_BLOCK_SIZE - 100)));
}

#[test]
fn test_tempo_change_while_recording_keeps_alignment() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);
    let block = driver.block_size();
    let stamps = |frame, channels| frame_stamps(frame, channels, block);

    engine.record(0).unwrap();
    let anchor = engine.transport().snapshot().start_frame.unwrap();
    driver.render_with_input(60, stamps);
    engine.pump();
    engine.set_bpm(77.0).unwrap();
    engine.resync_metronome().unwrap();
    driver.render_with_input(60, stamps);
    engine.stop().unwrap();
    driver.render_with_input(1, stamps);
    engine.pump();

    let (left, _) = engine.track_samples(0).unwrap();
    assert_eq!(left.len(), 120 * TEST_BLOCK_SIZE - anchor as usize);
    assert_aligned(&left, anchor, 0);
}

#[test]
fn test_recorded_take_plays_back() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);
    let anchor = record_take(&engine, &mut driver, 0, 40);
    let recorded = 40 * TEST_BLOCK_SIZE - anchor as usize;

    let start = driver.now() + 128;
    engine.play_at(start).unwrap();
    let from = driver.now();
    let out = left(&driver.render_until(start + recorded as u64 + 256));

    let offset = (start - from) as usize;
    assert_silence(&out[..offset], 0.0);
    assert_aligned(&out[offset..offset + recorded], anchor, 0);
    assert_silence(&out[offset + recorded..], 0.0);
}

#[test]
fn test_overdub_while_playing() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 2);
    let block = driver.block_size();
    let stamps = |frame, channels| frame_stamps(frame, channels, block);

    let first_anchor = record_take(&engine, &mut driver, 0, 40);

    engine.play().unwrap();
    let start = engine.transport().snapshot().start_frame.unwrap();
    let from = driver.now();
    let out = left(&driver.render_with_input(30, stamps));

    // Track 0 plays its take from the new start.
    let probe = (start + 10 - from) as usize;
    assert_eq!(out[probe], (first_anchor + 10) as f32);

    engine.record(1).unwrap();
    let record_from = (driver.now() - start) as usize;
    driver.render_with_input(40, stamps);
    engine.stop().unwrap();
    driver.render_with_input(1, stamps);
    engine.pump();

    let (left, right) = engine.track_samples(1).unwrap();
    assert!(left[..record_from].iter().all(|&s| s == 0.0));
    assert_aligned(&left, start, record_from);
    assert_eq!(left, right);
}

#[test]
fn test_multichannel_input_is_folded_to_stereo() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 4);

    engine.record(0).unwrap();
    driver.render_with_input(40, |_, channels| {
        [1.0, 10.0, 100.0, 1000.0].repeat(TEST_BLOCK_SIZE)[..TEST_BLOCK_SIZE * channels].to_vec()
    });
    engine.stop().unwrap();
    driver.render_blocks(1);
    engine.pump();

    let (left, right) = engine.track_samples(0).unwrap();
    assert!(!left.is_empty());
    assert!(left.iter().all(|&s| s == 101.0));
    assert!(right.iter().all(|&s| s == 1010.0));
}

#[test]
fn test_input_peak_is_reported() {
    let (engine, mut driver) = test_engine();
    attach_test_input(&engine, &mut driver, 1);

    driver.render_with_input(1, |_, _| vec![-0.7; TEST_BLOCK_SIZE]);
    assert!((engine.input_peak() - 0.7).abs() < 1e-6);
    assert_eq!(engine.input_peak(), 0.0);
    assert_eq!(engine.input_channels(), Some(1));
}

#[test]
fn test_input_loss_is_reported_once() {
    let (engine, mut driver) = test_engine();
    let events = engine.events();
    let status = attach_test_input(&engine, &mut driver, 1);

    status.mark_lost();
    engine.pump();
    engine.pump();

    let lost = drain_events(&events)
        .into_iter()
        .filter(|e| *e == EngineEvent::InputLost)
        .count();
    assert_eq!(lost, 1);
    assert!(matches!(engine.record(0), Err(Error::InputLost)));
}

#[test]
fn test_exhausted_batch_pool_reports_overrun() {
    let (engine, mut driver) = test_builder()
        .batch_blocks(1)
        .batch_pool_size(2)
        .build_offline()
        .unwrap();
    let events = engine.events();
    attach_test_input(&engine, &mut driver, 1);
    let block = driver.block_size();

    engine.record(0).unwrap();
    driver.render_with_input(20, |frame, channels| frame_stamps(frame, channels, block));
    engine.stop().unwrap();
    driver.render_blocks(1);
    engine.pump();

    let events = drain_events(&events);
    assert!(events.contains(&EngineEvent::RecorderOverrun {
        track: 0,
        dropped_frames: 18 * TEST_BLOCK_SIZE as u64,
    }));
    // Both delivered batches fell before the transport start.
    assert_eq!(recorded_event(&events, 0), Some((0, 2 * TEST_BLOCK_SIZE)));
}

#[test]
fn test_identical_sessions_render_identically() {
    fn session() -> (Vec<f32>, Vec<f32>) {
        let (engine, mut driver) = test_builder().metronome_gain(0.5).build_offline().unwrap();
        attach_test_input(&engine, &mut driver, 1);
        let block = driver.block_size();

        engine.record(0).unwrap();
        driver.render_with_input(100, |frame, _| {
            (0..block)
                .map(|i| ((frame + i as u64) as f32 * 0.01).sin())
                .collect()
        });
        engine.stop().unwrap();
        driver.render_blocks(1);
        engine.pump();

        engine.set_volume(0, -3.0).unwrap();
        engine.set_loop(0, 0, 0, true).unwrap();
        engine.play().unwrap();
        let out = driver.render_blocks(200);
        (out, engine.track_samples(0).unwrap().0)
    }

    let (out_a, take_a) = session();
    let (out_b, take_b) = session();
    assert_has_audio(&out_a, 0.01);
    assert_eq!(out_a, out_b);
    assert_eq!(take_a, take_b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_take_alignment_independent_of_block_and_batch_size(
        block in prop::sample::select(vec![64usize, 128, 256]),
        batch_blocks in 1usize..8,
        blocks in 20usize..80,
    ) {
        let (engine, mut driver) = test_builder()
            .block_size(block)
            .batch_blocks(batch_blocks)
            .build_offline()
            .unwrap();
        attach_test_input(&engine, &mut driver, 1);

        let anchor = record_take(&engine, &mut driver, 0, blocks);
        let (left, _) = engine.track_samples(0).unwrap();

        let expected = (blocks * block).saturating_sub(anchor as usize);
        prop_assert_eq!(left.len(), expected);
        for (i, &sample) in left.iter().enumerate() {
            prop_assert_eq!(sample, (anchor + i as u64) as f32);
        }
    }
}
