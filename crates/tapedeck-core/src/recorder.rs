//! Recorder renderer: accumulates the input feed into capture batches.

use crate::batch::{BatchSource, CaptureBatch};
use crate::command::{NotificationSender, RenderNotification};

/// Captures one track's worth of input into pooled batches.
///
/// Created on the control side and moved into the render engine with
/// [`RenderCommand::AttachRecorder`](crate::command::RenderCommand::AttachRecorder).
/// Every handle it holds is a clone of one the controller also keeps, so
/// dropping a finished recorder on the render thread frees nothing.
pub struct RecorderRenderer {
    track: usize,
    pool: BatchSource,
    notify: NotificationSender,
    current: Option<CaptureBatch>,
    sequence: u64,
    dropped_frames: u64,
}

impl RecorderRenderer {
    pub fn new(track: usize, pool: BatchSource, notify: NotificationSender) -> Self {
        Self {
            track,
            pool,
            notify,
            current: None,
            sequence: 0,
            dropped_frames: 0,
        }
    }

    pub fn track(&self) -> usize {
        self.track
    }

    /// Frames lost so far because the batch pool was empty.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Append one stereo block captured at absolute frame `block_start`.
    #[inline]
    pub(crate) fn capture(&mut self, block_start: u64, left: &[f32], right: &[f32]) {
        if self.current.is_none() {
            match self.pool.take() {
                Some(mut batch) => {
                    batch.reset(self.track, block_start);
                    batch.sequence = self.sequence;
                    self.current = Some(batch);
                }
                None => {
                    self.dropped_frames += left.len() as u64;
                    return;
                }
            }
        }

        let full = match self.current.as_mut() {
            Some(batch) => batch.push_block(left, right),
            None => false,
        };
        if full {
            if let Some(batch) = self.current.take() {
                self.deliver(batch);
            }
        }
    }

    fn deliver(&mut self, batch: CaptureBatch) {
        self.sequence += 1;
        if let Err(RenderNotification::Batch(batch)) =
            self.notify.post(RenderNotification::Batch(batch))
        {
            self.dropped_frames += batch.len() as u64;
            self.pool.put_back(batch);
        }
    }

    /// Flush a partially filled batch and post the stop marker behind it.
    pub(crate) fn finish(mut self) {
        if let Some(batch) = self.current.take() {
            if batch.is_empty() {
                self.pool.put_back(batch);
            } else {
                self.deliver(batch);
            }
        }
        // Cannot fail: the channel keeps a slot per open session.
        let _ = self.notify.post(RenderNotification::RecorderStopped {
            track: self.track,
            dropped_frames: self.dropped_frames,
        });
    }
}
