//! The RF path analysis engine: geodesy, diffraction, terrain, single-hop
//! and multi-hop link budgets, and radial viewshed mapping
//! (`spec.md` modules G-K).

pub mod diffraction;
pub mod events;
pub mod geodesy;
pub mod path_analyzer;
pub mod relay;
pub mod terrain;
pub mod viewshed;

pub use diffraction::DiffractionObstacle;
pub use events::{NullRfSink, RfEvent, RfEventSink};
pub use geodesy::LatLon;
pub use path_analyzer::{
    analyze_path, analyze_path_with_events, analyze_path_with_samples, classify_clearance, HopResult,
    HopStatus, LinkBudget, LinkParams, Obstruction, PathProfile, PathProfilePoint,
};
pub use relay::{analyze_multi_hop, analyze_multi_hop_with_events, MultiHopResult};
pub use terrain::{ElevationProvider, GridElevationProvider, TerrainSample};
pub use viewshed::{
    analyze_viewshed, analyze_viewshed_with_events, RadialResult, ViewshedPoint, ViewshedResolution,
    ViewshedResult,
};
