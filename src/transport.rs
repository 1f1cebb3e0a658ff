//! Transport state and its lock-free published snapshot.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Active transport: created by `play`, cleared by `stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TransportState {
    pub start_frame: u64,
}

/// Point-in-time view of the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub playing: bool,
    /// Absolute frame the current take started at. `None` while stopped.
    pub start_frame: Option<u64>,
    pub bpm: f64,
    pub beats_per_measure: u32,
}

/// Cloneable, lock-free reader of the latest [`TransportSnapshot`].
///
/// Readable from any thread, including a UI thread that never touches the
/// engine.
#[derive(Clone)]
pub struct TransportReader {
    inner: Arc<ArcSwap<TransportSnapshot>>,
}

impl TransportReader {
    pub(crate) fn new(bpm: f64, beats_per_measure: u32) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(TransportSnapshot {
                playing: false,
                start_frame: None,
                bpm,
                beats_per_measure,
            })),
        }
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        **self.inner.load()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.load().playing
    }

    pub fn bpm(&self) -> f64 {
        self.inner.load().bpm
    }

    pub(crate) fn publish(&self, snapshot: TransportSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}

impl std::fmt::Debug for TransportReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TransportReader")
            .field(&self.snapshot())
            .finish()
    }
}
