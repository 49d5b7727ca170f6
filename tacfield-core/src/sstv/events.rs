//! Typed event notifications, replacing an ad-hoc string-keyed pub/sub with
//! a closed enum the compiler can check (`spec.md` §9 design notes).

use super::decoder::DecoderPhase;

/// A single notification emitted by the SSTV engine while receiving or
/// transmitting.
#[derive(Debug, Clone, PartialEq)]
pub enum SstvEvent {
    /// The VIS preamble was decoded and a mode was identified.
    VisDetected { mode_name: &'static str, vis_code: u8 },
    /// No VIS preamble was found before the configured timeout elapsed.
    VisTimedOut { elapsed_ms: u64 },
    /// A decoder phase transition occurred.
    PhaseChanged { from: DecoderPhase, to: DecoderPhase },
    /// One raster row finished decoding.
    LineDecoded { row: usize, total_rows: usize },
    /// The full frame finished decoding.
    FrameComplete { width: usize, height: usize },
    /// Sync pulse tracking lost lock (interval fell outside tolerance).
    SyncLost,
    /// A receive session was armed via `start_receive`.
    ReceiveStarted,
    /// A receive session was torn down via `stop_receive`.
    ReceiveStopped,
    /// Transmission began for the named mode.
    TransmitStarted { mode_name: &'static str, duration_ms: f64 },
    /// Transmit-side progress, as a fraction of total samples emitted.
    TransmitProgress { fraction: f64 },
    /// Transmission finished.
    TransmitComplete,
    /// A fresh slant-factor estimate was computed and, if outside
    /// tolerance, applied to the completed raster.
    SlantAnalysis { expected_interval_ms: f64, measured_interval_ms: f64, factor: f64, percent: f64, sample_count: usize },
    /// A fresh drift-offset estimate crossed the confidence threshold
    /// required to apply compensation.
    DriftAnalysis { drift_hz: f64, confidence: f64, measured_sync_hz: f64, expected_sync_hz: f64, count: usize },
}

/// Anything that can receive [`SstvEvent`]s. Kept as a trait (rather than a
/// concrete channel type) so callers can fan events out to a UI, a log
/// sink, both, or neither.
pub trait EventSink {
    fn notify(&mut self, event: SstvEvent);
}

/// An [`EventSink`] that drops every event; the default when the caller
/// doesn't care about progress notifications.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: SstvEvent) {}
}

/// An [`EventSink`] backed by a bounded [`crossbeam::channel`], for
/// delivering events to a cooperating receive/transmit loop running on
/// another thread (`spec.md` §5 concurrency model).
pub struct ChannelSink {
    sender: crossbeam::channel::Sender<SstvEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, crossbeam::channel::Receiver<SstvEvent>) {
        let (sender, receiver) = crossbeam::channel::bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn notify(&mut self, event: SstvEvent) {
        // A full or disconnected channel means nobody is listening; dropping
        // the event here is preferable to blocking the decode loop.
        let _ = self.sender.try_send(event);
    }
}
