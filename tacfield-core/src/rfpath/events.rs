//! Progress notifications for long-running RF analyses (`spec.md` §9).

/// Progress events emitted while analyzing a single hop, a multi-hop chain,
/// or a viewshed sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RfEvent {
    HopAnalyzed { hop_index: usize, total_hops: usize },
    RadialCompleted { radial_index: usize, total_radials: usize },
    /// Coarse completion percentage for analyses with an up-front cost that
    /// doesn't map cleanly to a hop or radial count (the viewshed's single
    /// batched elevation fetch).
    Progress { percent: f64 },
    AnalysisComplete,
}

/// Anything that can receive [`RfEvent`]s, mirroring
/// [`crate::sstv::events::EventSink`] for the RF analysis side.
pub trait RfEventSink {
    fn notify(&mut self, event: RfEvent);
}

/// An [`RfEventSink`] that drops every event; the default for callers that
/// don't care about progress notifications.
#[derive(Debug, Default)]
pub struct NullRfSink;

impl RfEventSink for NullRfSink {
    fn notify(&mut self, _event: RfEvent) {}
}
