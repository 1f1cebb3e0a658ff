//! Input audio path into the render domain.
//!
//! A device callback (or a test) pushes interleaved samples through an
//! [`InputWriter`]; the render engine pulls exactly one block per render
//! callback from the matching [`InputFeed`] and folds it into the engine's
//! fixed stereo convention: even channels sum to left, odd channels to right,
//! and a mono source is copied to both sides.

use crate::lockfree::{AtomicFlag, AtomicFloat};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Status of an input source, shared by the writer, the feed and the controller.
#[derive(Debug, Default)]
pub struct InputStatus {
    lost: AtomicFlag,
    peak: AtomicFloat,
    overflow_frames: AtomicU64,
    underrun_frames: AtomicU64,
}

impl InputStatus {
    /// Flag the source as gone (device unplugged, stream error).
    pub fn mark_lost(&self) {
        self.lost.set(true);
    }

    pub fn is_lost(&self) -> bool {
        self.lost.get()
    }

    /// Peak absolute level since the last call.
    pub fn take_peak(&self) -> f32 {
        self.peak.take()
    }

    /// Frames the writer had to discard because the ring was full.
    pub fn overflow_frames(&self) -> u64 {
        self.overflow_frames.load(Ordering::Relaxed)
    }

    /// Frames the render engine had to fill with silence because no input was
    /// waiting.
    pub fn underrun_frames(&self) -> u64 {
        self.underrun_frames.load(Ordering::Relaxed)
    }
}

/// Producer end of an input ring.
pub struct InputWriter {
    producer: HeapProd<f32>,
    channels: usize,
    status: Arc<InputStatus>,
}

impl InputWriter {
    /// Push interleaved samples. Only whole frames are accepted; frames that
    /// don't fit are counted as overflow. Returns the number of frames pushed.
    pub fn push_interleaved(&mut self, samples: &[f32]) -> usize {
        let frames = samples.len() / self.channels;
        let room = self.producer.vacant_len() / self.channels;
        let accepted = frames.min(room);
        self.producer
            .push_slice(&samples[..accepted * self.channels]);
        if accepted < frames {
            self.status
                .overflow_frames
                .fetch_add((frames - accepted) as u64, Ordering::Relaxed);
        }
        accepted
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn status(&self) -> &Arc<InputStatus> {
        &self.status
    }
}

/// Consumer end of an input ring, owned by the render engine once attached.
pub struct InputFeed {
    consumer: HeapCons<f32>,
    channels: usize,
    scratch: Box<[f32]>,
    status: Arc<InputStatus>,
}

impl InputFeed {
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn status(&self) -> &Arc<InputStatus> {
        &self.status
    }

    /// Fill one stereo block from the ring. Missing frames are silent.
    #[inline]
    pub(crate) fn read_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let channels = self.channels;
        let wanted = (frames * channels).min(self.scratch.len());
        let available = (self.consumer.occupied_len() / channels) * channels;
        let read = self.consumer.pop_slice(&mut self.scratch[..wanted.min(available)]);
        let read_frames = read / channels;

        left.fill(0.0);
        right.fill(0.0);
        for frame in 0..read_frames {
            let base = frame * channels;
            for ch in 0..channels {
                let sample = self.scratch[base + ch];
                if ch % 2 == 0 {
                    left[frame] += sample;
                } else {
                    right[frame] += sample;
                }
            }
        }
        if channels == 1 {
            right[..read_frames].copy_from_slice(&left[..read_frames]);
        }

        if read_frames < frames {
            self.status
                .underrun_frames
                .fetch_add((frames - read_frames) as u64, Ordering::Relaxed);
        }

        let peak = left
            .iter()
            .chain(right.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        self.status.peak.raise(peak);
    }
}

/// Create a connected writer/feed pair.
///
/// `capacity_frames` sizes the ring; `block_size` sizes the feed's scratch so
/// the render path never allocates.
pub fn input_channel(
    channels: usize,
    capacity_frames: usize,
    block_size: usize,
) -> (InputWriter, InputFeed) {
    let channels = channels.max(1);
    let (producer, consumer) = HeapRb::<f32>::new(capacity_frames.max(block_size) * channels).split();
    let status = Arc::new(InputStatus::default());
    (
        InputWriter {
            producer,
            channels,
            status: Arc::clone(&status),
        },
        InputFeed {
            consumer,
            channels,
            scratch: vec![0.0; block_size * channels].into_boxed_slice(),
            status,
        },
    )
}
