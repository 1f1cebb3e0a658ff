//! Preallocated capture batches.
//!
//! Recorders never allocate. A fixed number of batches is created when the
//! engine is built and circulates between the two domains:
//!
//! ```text
//!   free pool ──► recorder fills ──► notification channel ──► controller
//!       ▲                                                          │
//!       └──────────────────── recycle after write-back ◄───────────┘
//! ```

use crossbeam_channel::{bounded, Receiver, Sender};

/// One chunk of captured stereo audio tagged with the absolute frame of its
/// first sample.
#[derive(Debug)]
pub struct CaptureBatch {
    pub(crate) track: usize,
    pub(crate) frame: u64,
    pub(crate) sequence: u64,
    pub(crate) len: usize,
    pub(crate) left: Box<[f32]>,
    pub(crate) right: Box<[f32]>,
}

impl CaptureBatch {
    fn new(frames: usize) -> Self {
        Self {
            track: 0,
            frame: 0,
            sequence: 0,
            len: 0,
            left: vec![0.0; frames].into_boxed_slice(),
            right: vec![0.0; frames].into_boxed_slice(),
        }
    }

    /// Track the batch was captured for.
    pub fn track(&self) -> usize {
        self.track
    }

    /// Absolute frame number of the first sample.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Position of this batch within its recording session, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Valid frames. Equal to [`capacity`](Self::capacity) for every batch
    /// except a final partial one flushed when a recorder stops.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    pub fn left(&self) -> &[f32] {
        &self.left[..self.len]
    }

    pub fn right(&self) -> &[f32] {
        &self.right[..self.len]
    }

    pub(crate) fn reset(&mut self, track: usize, frame: u64) {
        self.track = track;
        self.frame = frame;
        self.sequence = 0;
        self.len = 0;
    }

    /// Append one stereo block. Returns `true` once the batch is full.
    #[inline]
    pub(crate) fn push_block(&mut self, left: &[f32], right: &[f32]) -> bool {
        let end = self.len + left.len();
        self.left[self.len..end].copy_from_slice(left);
        self.right[self.len..end].copy_from_slice(right);
        self.len = end;
        self.len == self.capacity()
    }
}

/// Control-side handle of the batch pool: returns consumed batches.
#[derive(Debug, Clone)]
pub struct BatchRecycler {
    free_tx: Sender<CaptureBatch>,
}

impl BatchRecycler {
    /// Hand a batch back to the pool after write-back.
    pub fn recycle(&self, batch: CaptureBatch) {
        let _ = self.free_tx.try_send(batch);
    }
}

/// Render-side handle of the batch pool.
#[derive(Debug, Clone)]
pub struct BatchSource {
    free_rx: Receiver<CaptureBatch>,
    free_tx: Sender<CaptureBatch>,
}

impl BatchSource {
    #[inline]
    pub(crate) fn take(&self) -> Option<CaptureBatch> {
        self.free_rx.try_recv().ok()
    }

    /// Put a batch back without delivering it.
    #[inline]
    pub(crate) fn put_back(&self, batch: CaptureBatch) {
        let _ = self.free_tx.try_send(batch);
    }

    /// Free batches currently available.
    pub fn available(&self) -> usize {
        self.free_rx.len()
    }
}

/// Allocate `count` batches of `frames` frames each.
pub fn batch_pool(count: usize, frames: usize) -> (BatchSource, BatchRecycler) {
    let (free_tx, free_rx) = bounded(count);
    for _ in 0..count {
        let _ = free_tx.try_send(CaptureBatch::new(frames));
    }
    (
        BatchSource {
            free_rx,
            free_tx: free_tx.clone(),
        },
        BatchRecycler { free_tx },
    )
}
