//! Fixed-capacity stereo track storage shared between the controller and a
//! playback renderer.
//!
//! Samples are stored as relaxed atomics so a buffer handed off to the render
//! domain by `Arc` can still be written by the controller without a data race.
//! On every mainstream target a relaxed `AtomicF32` load/store compiles to a
//! plain move.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Result of writing one captured batch into a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    pub written: usize,
    pub dropped: usize,
}

/// Preallocated left/right sample arrays for one track.
///
/// Capacity is fixed at construction. Writes outside `[0, capacity)` are
/// dropped; reads outside it return silence.
#[derive(Debug)]
pub struct TrackBuffer {
    left: Box<[AtomicF32]>,
    right: Box<[AtomicF32]>,
    recorded: AtomicUsize,
}

impl TrackBuffer {
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            left: (0..frames).map(|_| AtomicF32::new(0.0)).collect(),
            right: (0..frames).map(|_| AtomicF32::new(0.0)).collect(),
            recorded: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// High-water mark of written frames: one past the last frame ever written.
    #[inline]
    pub fn recorded_frames(&self) -> usize {
        self.recorded.load(Ordering::Acquire)
    }

    pub fn has_audio(&self) -> bool {
        self.recorded_frames() > 0
    }

    /// Read one stereo frame. Out-of-range positions are silent.
    #[inline]
    pub fn frame(&self, index: i64) -> (f32, f32) {
        if index < 0 {
            return (0.0, 0.0);
        }
        let index = index as usize;
        match (self.left.get(index), self.right.get(index)) {
            (Some(l), Some(r)) => (l.load(Ordering::Relaxed), r.load(Ordering::Relaxed)),
            _ => (0.0, 0.0),
        }
    }

    /// Write `left`/`right` starting at `offset` frames into the track.
    ///
    /// The part of the range that falls outside the buffer is dropped, never
    /// wrapped.
    pub fn write_at(&self, offset: i64, left: &[f32], right: &[f32]) -> WriteSummary {
        let len = left.len().min(right.len());
        let capacity = self.capacity() as i64;

        let start = offset.clamp(0, capacity);
        let end = offset.saturating_add(len as i64).clamp(0, capacity);
        if end <= start {
            return WriteSummary {
                written: 0,
                dropped: len,
            };
        }

        let skip = (start - offset) as usize;
        let count = (end - start) as usize;
        let dst = start as usize;
        for i in 0..count {
            self.left[dst + i].store(left[skip + i], Ordering::Relaxed);
            self.right[dst + i].store(right[skip + i], Ordering::Relaxed);
        }
        self.recorded.fetch_max(dst + count, Ordering::AcqRel);

        WriteSummary {
            written: count,
            dropped: len - count,
        }
    }

    /// Copy the recorded extent out as owned vectors.
    pub fn to_vecs(&self) -> (Vec<f32>, Vec<f32>) {
        let len = self.recorded_frames();
        let left = self.left[..len]
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
            .collect();
        let right = self.right[..len]
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
            .collect();
        (left, right)
    }

    /// Zero the buffer and forget the recorded extent. Capacity is unchanged.
    pub fn clear(&self) {
        for sample in self.left.iter().chain(self.right.iter()) {
            sample.store(0.0, Ordering::Relaxed);
        }
        self.recorded.store(0, Ordering::Release);
    }
}
