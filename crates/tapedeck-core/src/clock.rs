//! Absolute frame clock shared by every renderer.
//!
//! The clock is split in two: [`FrameClock`] is a cheap, cloneable read handle
//! and [`ClockDriver`] is the single write handle owned by the render engine.
//! Only the driver can advance the counter and nothing can reset it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only handle to the absolute frame counter.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl FrameClock {
    /// Create a new clock at frame zero together with its driver.
    pub fn new(sample_rate: f64) -> (FrameClock, ClockDriver) {
        let frames = Arc::new(AtomicU64::new(0));
        (
            FrameClock {
                frames: Arc::clone(&frames),
                sample_rate,
            },
            ClockDriver { frames },
        )
    }

    /// Absolute frame of the start of the next block to be rendered.
    #[inline]
    pub fn now(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Seconds between `frame` and the current clock position. Negative while
    /// `frame` is still in the future.
    pub fn seconds_since(&self, frame: u64) -> f64 {
        (self.now() as f64 - frame as f64) / self.sample_rate
    }
}

/// Write handle for the frame clock. Not `Clone`: exactly one exists.
#[derive(Debug)]
pub struct ClockDriver {
    frames: Arc<AtomicU64>,
}

impl ClockDriver {
    #[inline]
    pub fn now(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Advance by one render block.
    #[inline]
    pub(crate) fn advance(&mut self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Release);
    }
}
