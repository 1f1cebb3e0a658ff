//! Per-track playback renderer.
//!
//! Output is a pure function of the absolute frame, the start frame and the
//! loop/latency parameters, so the same frame always yields the same sample
//! regardless of block size or when the command arrived.

use crate::command::PlaybackParams;
use crate::track::TrackBuffer;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PlaybackRenderer {
    buffer: Option<Arc<TrackBuffer>>,
    start_frame: Option<u64>,
    looping: bool,
    params: PlaybackParams,
}

impl PlaybackRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand over the track storage. The previous buffer (if any) is returned.
    ///
    /// The controller keeps its own reference to every track buffer, so
    /// releasing the returned `Arc` never frees memory on the render thread.
    pub fn set_buffer(&mut self, buffer: Arc<TrackBuffer>) -> Option<Arc<TrackBuffer>> {
        self.buffer.replace(buffer)
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn start(&mut self, start_frame: u64, looping: bool) {
        self.start_frame = Some(start_frame);
        self.looping = looping;
    }

    /// Clear the start frame. The buffer is kept.
    pub fn stop(&mut self) {
        self.start_frame = None;
    }

    pub fn is_playing(&self) -> bool {
        self.start_frame.is_some()
    }

    pub fn set_params(&mut self, params: PlaybackParams) {
        self.params = params;
    }

    pub fn params(&self) -> PlaybackParams {
        self.params
    }

    /// Loop length in frames. Falls back to the recorded extent after
    /// `loop_start` when no explicit duration is set.
    fn loop_length(&self, buffer: &TrackBuffer) -> u64 {
        if self.params.loop_duration > 0 {
            self.params.loop_duration
        } else {
            (buffer.recorded_frames() as u64).saturating_sub(self.params.loop_start)
        }
    }

    /// Render one block starting at absolute frame `block_start`. The output is
    /// overwritten.
    pub fn render(&mut self, block_start: u64, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);

        let (Some(start), Some(buffer)) = (self.start_frame, self.buffer.as_deref()) else {
            return;
        };

        let loop_length = if self.looping {
            match self.loop_length(buffer) {
                0 => return,
                n => Some(n),
            }
        } else {
            None
        };
        let base = self.params.loop_start as i64 + self.params.latency_frames;

        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let frame = block_start + i as u64;
            if frame < start {
                continue;
            }
            let elapsed = frame - start;
            let position = match loop_length {
                Some(length) => elapsed % length,
                None => {
                    if self.params.loop_duration > 0 && elapsed >= self.params.loop_duration {
                        continue;
                    }
                    elapsed
                }
            };
            let (sl, sr) = buffer.frame(base + position as i64);
            *l = sl;
            *r = sr;
        }
    }
}
