//! Metronome renderer: sample-accurate sine clicks on an integer beat grid.
//!
//! Beat boundaries are kept as absolute frame numbers and advanced by an
//! integer `frames_per_beat`, so there is no accumulated floating-point drift
//! however long the transport runs.

use crate::command::MetronomeUpdate;
use crate::units::frames_per_beat;
use core::f64::consts::TAU;

/// Tone of beat zero in each measure.
pub const DOWNBEAT_HZ: f64 = 800.0;
/// Tone of every other beat.
pub const BEAT_HZ: f64 = 400.0;

/// A beat that has been sounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// Absolute frame of the beat boundary.
    pub frame: u64,
    /// Position within the measure. Zero is the downbeat.
    pub index: u32,
}

impl Beat {
    pub fn is_downbeat(&self) -> bool {
        self.index == 0
    }
}

/// Click generator driven by the render engine.
///
/// Idle until it receives a start frame, then emits one beep per beat.
#[derive(Debug, Clone)]
pub struct MetronomeRenderer {
    sample_rate: f64,
    bpm: f64,
    beats_per_measure: u32,
    beep_frames: u64,
    /// `None` while idle.
    next_beat: Option<u64>,
    /// Index within the measure of the beat at `next_beat`.
    next_index: u32,
    last_beat: Option<Beat>,
}

impl MetronomeRenderer {
    pub fn new(sample_rate: f64, bpm: f64, beats_per_measure: u32, beep_frames: u64) -> Self {
        Self {
            sample_rate,
            bpm,
            beats_per_measure: beats_per_measure.max(1),
            beep_frames,
            next_beat: None,
            next_index: 0,
            last_beat: None,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn is_running(&self) -> bool {
        self.next_beat.is_some()
    }

    pub fn next_beat_frame(&self) -> Option<u64> {
        self.next_beat
    }

    pub fn last_beat(&self) -> Option<Beat> {
        self.last_beat
    }

    /// Apply a partial update. A start frame restarts the sequence so that a
    /// downbeat lands on it; tempo and meter changes alone keep the phase.
    pub fn update(&mut self, update: MetronomeUpdate) {
        if let Some(beats) = update.beats_per_measure {
            self.beats_per_measure = beats.max(1);
            self.next_index %= self.beats_per_measure;
        }
        if let Some(bpm) = update.bpm {
            self.bpm = bpm;
        }
        if let Some(start) = update.start_frame {
            self.next_beat = Some(start);
            self.next_index = 0;
            self.last_beat = None;
        }
    }

    /// Return to idle.
    pub fn stop(&mut self) {
        self.next_beat = None;
        self.next_index = 0;
        self.last_beat = None;
    }

    /// Render one block starting at absolute frame `block_start`.
    ///
    /// Both channels receive the same signal. The output is overwritten.
    pub fn render(&mut self, block_start: u64, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);

        let Some(mut next) = self.next_beat else {
            return;
        };
        let fpb = frames_per_beat(self.bpm, self.sample_rate);
        let measure = u64::from(self.beats_per_measure);
        let block_end = block_start + left.len() as u64;

        let mut frame = block_start;
        while frame < block_end {
            if frame >= next {
                // Jump straight to the latest boundary at or before `frame`. When
                // a start arrives late this skips the missed beats silently.
                let skipped = (frame - next) / fpb;
                let index = ((u64::from(self.next_index) + skipped) % measure) as u32;
                let beat_frame = next + skipped * fpb;
                self.last_beat = Some(Beat {
                    frame: beat_frame,
                    index,
                });
                next = beat_frame + fpb;
                self.next_index = (index + 1) % self.beats_per_measure;
            }

            let segment_end = next.min(block_end);
            if let Some(beat) = self.last_beat {
                let beep_end = (beat.frame + self.beep_frames).min(segment_end);
                if frame < beep_end {
                    let hz = if beat.is_downbeat() { DOWNBEAT_HZ } else { BEAT_HZ };
                    let step = TAU * hz / self.sample_rate;
                    for f in frame..beep_end {
                        let sample = ((f - beat.frame) as f64 * step).sin() as f32;
                        let i = (f - block_start) as usize;
                        left[i] = sample;
                        right[i] = sample;
                    }
                }
            }
            frame = segment_end;
        }

        self.next_beat = Some(next);
    }
}
