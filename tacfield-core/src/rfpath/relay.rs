//! Multi-hop relay chain analysis (`spec.md` §4.J).

use super::events::{NullRfSink, RfEvent, RfEventSink};
use super::geodesy::{haversine_distance_m, LatLon};
use super::path_analyzer::{analyze_path_with_samples, profile_sample_count, HopResult, LinkParams};
use super::terrain::ElevationProvider;

/// The outcome of analyzing a chain of relay hops. A hop that fails to
/// analyze (typically missing elevation coverage) is recorded as an `Err`
/// at its position rather than aborting the rest of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiHopResult {
    pub hops: Vec<Result<HopResult, String>>,
    /// Index into `hops` of the weakest successfully analyzed hop, by link
    /// margin. `None` if every hop failed to analyze.
    pub weakest_hop_index: Option<usize>,
    pub weakest_hop_margin_db: f64,
    pub any_hop_obstructed: bool,
    /// The chain is viable only if every hop analyzed successfully and
    /// cleared its link budget.
    pub viable: bool,
}

/// Analyze every consecutive pair of `waypoints` as one hop each, sharing
/// `params` across all hops (`spec.md` §6 `analyze_multi_hop`).
pub fn analyze_multi_hop(
    waypoints: &[LatLon],
    elevation: &dyn ElevationProvider,
    params: &LinkParams,
) -> MultiHopResult {
    analyze_multi_hop_with_events(waypoints, elevation, params, &mut NullRfSink)
}

pub fn analyze_multi_hop_with_events(
    waypoints: &[LatLon],
    elevation: &dyn ElevationProvider,
    params: &LinkParams,
    sink: &mut dyn RfEventSink,
) -> MultiHopResult {
    let total_hops = waypoints.len().saturating_sub(1);
    let mut hops = Vec::with_capacity(total_hops);
    for (i, pair) in waypoints.windows(2).enumerate() {
        let distance_m = haversine_distance_m(pair[0], pair[1]);
        let num_samples = profile_sample_count(distance_m);
        let hop = analyze_path_with_samples(pair[0], pair[1], elevation, params, num_samples)
            .map_err(|e| e.to_string());
        hops.push(hop);
        sink.notify(RfEvent::HopAnalyzed { hop_index: i, total_hops });
    }

    let weakest = hops
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.as_ref().ok().map(|r| (i, r.link_budget.margin_db)))
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap());

    let any_hop_obstructed = hops.iter().any(|h| matches!(h, Ok(r) if r.is_obstructed));
    let viable = !hops.is_empty() && hops.iter().all(|h| matches!(h, Ok(r) if r.link_budget.viable));

    sink.notify(RfEvent::AnalysisComplete);

    MultiHopResult {
        hops,
        weakest_hop_index: weakest.map(|(i, _)| i),
        weakest_hop_margin_db: weakest.map(|(_, m)| m).unwrap_or(f64::NEG_INFINITY),
        any_hop_obstructed,
        viable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfpath::terrain::GridElevationProvider;

    fn default_params() -> LinkParams {
        LinkParams {
            freq_hz: 146_000_000.0,
            tx_power_dbm: 37.0,
            tx_gain_dbi: 6.0,
            rx_gain_dbi: 6.0,
            tx_antenna_height_m: 10.0,
            rx_antenna_height_m: 10.0,
            misc_losses_db: 2.0,
            rx_sensitivity_dbm: -110.0,
        }
    }

    #[test]
    fn three_waypoint_chain_produces_two_hops() {
        let waypoints = vec![
            LatLon { lat_deg: 40.0, lon_deg: -105.0 },
            LatLon { lat_deg: 40.05, lon_deg: -105.0 },
            LatLon { lat_deg: 40.1, lon_deg: -105.0 },
        ];
        let elevation = GridElevationProvider::flat(5000.0);
        let result = analyze_multi_hop(&waypoints, &elevation, &default_params());
        assert_eq!(result.hops.len(), 2);
        assert!(result.hops.iter().all(|h| h.is_ok()));
        assert!(result.viable);
    }

    #[test]
    fn weakest_hop_is_the_longest_one_on_uniform_terrain() {
        let waypoints = vec![
            LatLon { lat_deg: 40.0, lon_deg: -105.0 },
            LatLon { lat_deg: 40.01, lon_deg: -105.0 },
            LatLon { lat_deg: 40.3, lon_deg: -105.0 },
        ];
        let elevation = GridElevationProvider::flat(5000.0);
        let result = analyze_multi_hop(&waypoints, &elevation, &default_params());
        assert_eq!(result.weakest_hop_index, Some(1));
    }

    #[test]
    fn a_hop_too_short_to_analyze_is_marked_without_aborting_the_chain() {
        let waypoints = vec![
            LatLon { lat_deg: 40.0, lon_deg: -105.0 },
            LatLon { lat_deg: 40.00001, lon_deg: -105.0 }, // well under the 100 m minimum
            LatLon { lat_deg: 40.1, lon_deg: -105.0 },
        ];
        let elevation = GridElevationProvider::flat(5000.0);
        let result = analyze_multi_hop(&waypoints, &elevation, &default_params());
        assert_eq!(result.hops.len(), 2);
        assert!(result.hops[0].is_err());
        assert!(result.hops[1].is_ok());
        assert!(!result.viable);
        assert_eq!(result.weakest_hop_index, Some(1));
    }
}
