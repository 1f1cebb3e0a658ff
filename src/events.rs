//! Engine events delivered to the UI layer.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Capacity of the event channel. Events beyond it are dropped until the
/// consumer catches up.
pub(crate) const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Seconds since the transport start. Published on every `pump` while
    /// playing.
    TimeUpdate { seconds: f64 },
    /// A take has been fully written back into its track.
    TrackRecorded {
        track: usize,
        frames_written: usize,
        frames_clipped: usize,
    },
    TransportStarted { start_frame: u64 },
    TransportStopped { frame: u64 },
    /// The active input source disappeared. Reported once per source.
    InputLost,
    /// The output stream reported an error. Reported once per device.
    OutputLost,
    /// A recorder ran out of pooled batches and dropped audio.
    RecorderOverrun { track: usize, dropped_frames: u64 },
}

pub(crate) struct EventBus {
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(EVENT_CAPACITY);
        Self { tx, rx }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Err(TrySendError::Full(event)) = self.tx.try_send(event) {
            tracing::debug!(?event, "event channel full, dropping event");
        }
    }

    pub fn receiver(&self) -> Receiver<EngineEvent> {
        self.rx.clone()
    }
}
