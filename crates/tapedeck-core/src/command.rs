//! Typed messages crossing the control/render boundary.
//!
//! Control → render: a wait-free SPSC ring of [`RenderCommand`]s, drained at
//! the top of every render block.
//!
//! Render → control: a bounded channel of [`RenderNotification`]s that moves
//! ownership of captured batches (and anything else the render thread must
//! not drop) back to the controller.

use crate::batch::CaptureBatch;
use crate::input::InputFeed;
use crate::recorder::RecorderRenderer;
use crate::track::TrackBuffer;
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;

/// Partial metronome update. `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetronomeUpdate {
    pub bpm: Option<f64>,
    pub beats_per_measure: Option<u32>,
    /// Restart the beat sequence so beat 0 (a downbeat) lands on this frame.
    pub start_frame: Option<u64>,
}

/// Low-rate playback parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackParams {
    pub loop_start: u64,
    /// Loop length in frames. Zero means "to the end of the recorded extent".
    pub loop_duration: u64,
    /// Offset added to the read position to cancel round-trip device latency.
    pub latency_frames: i64,
}

/// Destination of a gain change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainTarget {
    Track(usize),
    Metronome,
}

/// Commands applied by the render engine at the next block boundary.
pub enum RenderCommand {
    Metronome(MetronomeUpdate),
    StopMetronome,
    SetBuffers {
        track: usize,
        buffer: Arc<TrackBuffer>,
    },
    StartPlayback {
        track: usize,
        start_frame: u64,
        looping: bool,
    },
    StopPlayback {
        track: usize,
    },
    SetPlaybackParams {
        track: usize,
        params: PlaybackParams,
    },
    SetGain {
        target: GainTarget,
        value: f32,
        time_constant: f32,
    },
    AttachRecorder(RecorderRenderer),
    StopRecorder {
        track: usize,
    },
    AttachInput(InputFeed),
    DetachInput,
}

/// Messages posted by the render engine.
pub enum RenderNotification {
    /// A captured batch ready for write-back.
    Batch(CaptureBatch),
    /// A recorder has flushed its last batch and been torn down.
    RecorderStopped { track: usize, dropped_frames: u64 },
    /// A detached or replaced input feed, returned so its ring is released on
    /// the control side.
    InputRetired(InputFeed),
}

/// Control-side command producer.
pub struct CommandSender {
    producer: HeapProd<RenderCommand>,
}

impl CommandSender {
    /// Queue a command. Fails only when the ring is full.
    pub fn send(&mut self, command: RenderCommand) -> Result<()> {
        self.producer
            .try_push(command)
            .map_err(|_| Error::CommandQueueFull)
    }
}

/// Render-side command consumer.
pub struct CommandReceiver {
    consumer: HeapCons<RenderCommand>,
}

impl CommandReceiver {
    #[inline]
    pub(crate) fn try_recv(&mut self) -> Option<RenderCommand> {
        self.consumer.try_pop()
    }
}

pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::<RenderCommand>::new(capacity).split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

/// Render-side notification sender.
#[derive(Clone)]
pub struct NotificationSender {
    tx: Sender<RenderNotification>,
}

impl NotificationSender {
    /// Post without blocking. On a full channel the message is handed back.
    #[inline]
    pub(crate) fn post(&self, message: RenderNotification) -> core::result::Result<(), RenderNotification> {
        self.tx.try_send(message).map_err(|e| e.into_inner())
    }
}

/// Control-side notification receiver.
pub struct NotificationReceiver {
    rx: Receiver<RenderNotification>,
}

impl NotificationReceiver {
    pub fn try_recv(&self) -> Option<RenderNotification> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = bounded(capacity);
    (NotificationSender { tx }, NotificationReceiver { rx })
}
