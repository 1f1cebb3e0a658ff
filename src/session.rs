//! Recording sessions: per-take write-back of captured batches.

use tapedeck_core::{CaptureBatch, TrackBuffer};

/// One take on one track.
///
/// Anchored to the transport start frame at the time `record` was issued, so
/// batches that arrive after `stop` (or after a tempo change) still land at
/// the right offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordingSession {
    pub track: usize,
    pub anchor_frame: u64,
    pub next_sequence: u64,
    pub frames_written: usize,
    pub frames_clipped: usize,
    /// `stop` has been sent; waiting for the render side to confirm.
    pub stopping: bool,
}

impl RecordingSession {
    pub fn new(track: usize, anchor_frame: u64) -> Self {
        Self {
            track,
            anchor_frame,
            next_sequence: 0,
            frames_written: 0,
            frames_clipped: 0,
            stopping: false,
        }
    }

    /// Write `batch` into `buffer` at `batch.frame() - anchor`.
    ///
    /// Returns `false` if the batch was not the next one in sequence. It is
    /// still written: its frame tag alone decides where it goes.
    pub fn integrate(&mut self, batch: &CaptureBatch, buffer: &TrackBuffer) -> bool {
        let in_order = batch.sequence() == self.next_sequence;
        self.next_sequence = batch.sequence() + 1;

        let offset = batch.frame() as i64 - self.anchor_frame as i64;
        let summary = buffer.write_at(offset, batch.left(), batch.right());
        self.frames_written += summary.written;
        self.frames_clipped += summary.dropped;
        in_order
    }
}
