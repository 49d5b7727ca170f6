//! Single-hop path analysis: terrain profiling, clearance, and link budget
//! (`spec.md` §4.I).

use crate::errors::{Result, RfError};

use super::diffraction::{deygout_analysis, DiffractionObstacle};
use super::events::{NullRfSink, RfEvent, RfEventSink};
use super::geodesy::{
    earth_curvature_drop_m, feet_to_meters, forward_bearing_deg, free_space_path_loss_db,
    fresnel_radius_m, haversine_distance_m, intermediate_point, received_power_dbm, LatLon,
};
use super::terrain::{ElevationProvider, TerrainSample};

const MIN_DISTANCE_M: f64 = 100.0;
const MAX_DISTANCE_M: f64 = 500_000.0;
const MIN_PROFILE_SAMPLES: i64 = 50;
const MAX_PROFILE_SAMPLES: i64 = 200;
const PROFILE_SAMPLE_SPACING_M: f64 = 100.0;

/// First-Fresnel-zone clearance percentage conventionally treated as a
/// clear line of sight.
pub const FIRST_FRESNEL_CLEAR_PERCENT: f64 = 60.0;

/// Antenna and radio parameters for one hop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkParams {
    pub freq_hz: f64,
    pub tx_power_dbm: f64,
    pub tx_gain_dbi: f64,
    pub rx_gain_dbi: f64,
    pub tx_antenna_height_m: f64,
    pub rx_antenna_height_m: f64,
    pub misc_losses_db: f64,
    pub rx_sensitivity_dbm: f64,
}

/// The Fresnel-clearance health of a hop or a single viewshed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopStatus {
    Clear,
    Marginal,
    Obstructed,
}

/// Classify a clearance/Fresnel-radius pair the same way for every path
/// analysis (single hop or viewshed sample): negative clearance means the
/// terrain intrudes directly into the path; below the clear threshold but
/// still positive is marginal.
pub fn classify_clearance(clearance_m: f64, clearance_percent_of_first_fresnel: f64) -> HopStatus {
    if clearance_m < 0.0 {
        HopStatus::Obstructed
    } else if clearance_percent_of_first_fresnel >= FIRST_FRESNEL_CLEAR_PERCENT {
        HopStatus::Clear
    } else {
        HopStatus::Marginal
    }
}

/// A sampled point where the terrain directly intrudes into the path
/// (negative clearance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstruction {
    pub distance_m: f64,
    pub clearance_m: f64,
}

/// One sample's full line-of-sight/Fresnel analysis along a path profile
/// (`spec.md` §3 "Path profile").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProfilePoint {
    pub distance_m: f64,
    pub terrain_elevation_m: f64,
    pub los_elevation_after_curvature_m: f64,
    pub fresnel_upper_m: f64,
    pub fresnel_lower_m: f64,
    pub clearance_m: f64,
    pub clearance_percent_of_first_fresnel: f64,
}

/// The sampled terrain profile between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PathProfile {
    pub samples: Vec<TerrainSample>,
    pub points: Vec<PathProfilePoint>,
    pub total_distance_m: f64,
}

/// The transmit-side EIRP, the power actually received, the margin over the
/// receiver's sensitivity, and whether the link clears it
/// (`spec.md` §4.I point 7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkBudget {
    pub eirp_dbm: f64,
    pub received_power_dbm: f64,
    pub margin_db: f64,
    pub viable: bool,
}

/// The outcome of analyzing a single hop between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct HopResult {
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub profile: PathProfile,
    /// Clearance of the direct path over the worst interior obstruction, as
    /// a fraction of the first Fresnel zone radius at that point (negative
    /// means the terrain intrudes into the path).
    pub fresnel_clearance_fraction: f64,
    pub status: HopStatus,
    pub is_obstructed: bool,
    pub obstructions: Vec<Obstruction>,
    pub diffraction_obstacles: Vec<DiffractionObstacle>,
    pub diffraction_loss_db: f64,
    pub free_space_path_loss_db: f64,
    pub total_path_loss_db: f64,
    pub received_power_dbm: f64,
    pub link_budget: LinkBudget,
}

/// `N = clamp(50, 200, ceil(distance_m / 100))` (`spec.md` §4.I point 2).
pub fn profile_sample_count(distance_m: f64) -> usize {
    let raw = (distance_m / PROFILE_SAMPLE_SPACING_M).ceil() as i64;
    raw.clamp(MIN_PROFILE_SAMPLES, MAX_PROFILE_SAMPLES) as usize
}

/// Sample terrain elevation at `num_samples` evenly spaced points between
/// `tx` and `rx` with a single batched elevation request, converting the
/// provider's feet to meters at the boundary. A point with no coverage is
/// forward-filled from the previous sample (zero at index 0); the whole
/// profile only errors if every sample is unknown.
fn build_profile(
    tx: LatLon,
    rx: LatLon,
    elevation: &dyn ElevationProvider,
    num_samples: usize,
) -> Result<PathProfile> {
    let total_distance_m = haversine_distance_m(tx, rx);
    let divisor = (num_samples - 1).max(1) as f64;
    let points: Vec<LatLon> = (0..num_samples)
        .map(|i| intermediate_point(tx, rx, i as f64 / divisor))
        .collect();
    let feet = elevation.elevations_feet(&points);

    let mut samples = Vec::with_capacity(num_samples);
    let mut previous_elevation_m = 0.0;
    let mut any_known = false;
    for (i, sample_feet) in feet.iter().enumerate() {
        let elevation_m = match sample_feet {
            Some(ft) => {
                any_known = true;
                feet_to_meters(*ft)
            }
            None => previous_elevation_m,
        };
        previous_elevation_m = elevation_m;
        samples.push(TerrainSample { distance_m: (i as f64 / divisor) * total_distance_m, elevation_m });
    }

    if !any_known {
        return Err(RfError::ElevationUnavailable.into());
    }

    Ok(PathProfile { samples, points: Vec::new(), total_distance_m })
}

/// Enrich each raw terrain sample with its curvature-adjusted
/// line-of-sight height, Fresnel envelope, and clearance
/// (`spec.md` §4.I point 4).
fn analyze_profile_points(
    samples: &[TerrainSample],
    total_distance_m: f64,
    tx_height_m: f64,
    rx_height_m: f64,
    freq_hz: f64,
) -> Vec<PathProfilePoint> {
    let total = total_distance_m.max(1e-9);
    samples
        .iter()
        .map(|s| {
            let los = tx_height_m + (rx_height_m - tx_height_m) * s.distance_m / total;
            let bulge = earth_curvature_drop_m(s.distance_m, total_distance_m);
            let los_after_curvature = los - bulge;

            let d1 = s.distance_m.max(1e-6);
            let radius = fresnel_radius_m(d1, total_distance_m, freq_hz).max(1e-9);

            let clearance_m = los_after_curvature - s.elevation_m;
            let clearance_percent = 100.0 * clearance_m / radius;

            PathProfilePoint {
                distance_m: s.distance_m,
                terrain_elevation_m: s.elevation_m,
                los_elevation_after_curvature_m: los_after_curvature,
                fresnel_upper_m: los_after_curvature + radius,
                fresnel_lower_m: los_after_curvature - radius,
                clearance_m,
                clearance_percent_of_first_fresnel: clearance_percent,
            }
        })
        .collect()
}

/// Worst (minimum) clearance fraction among the interior points, excluding
/// the two endpoints which sit at the antennas themselves.
fn worst_interior_clearance_percent(points: &[PathProfilePoint]) -> f64 {
    if points.len() <= 2 {
        return f64::INFINITY;
    }
    points[1..points.len() - 1]
        .iter()
        .map(|p| p.clearance_percent_of_first_fresnel)
        .fold(f64::INFINITY, f64::min)
}

fn direct_obstructions(points: &[PathProfilePoint]) -> Vec<Obstruction> {
    points
        .iter()
        .filter(|p| classify_clearance(p.clearance_m, p.clearance_percent_of_first_fresnel) == HopStatus::Obstructed)
        .map(|p| Obstruction { distance_m: p.distance_m, clearance_m: p.clearance_m })
        .collect()
}

/// Analyze the path between `tx` and `rx`: terrain profile, Fresnel
/// clearance, Deygout diffraction loss, and full link budget
/// (`spec.md` §4.I, §6 `analyze_path`).
pub fn analyze_path(
    tx: LatLon,
    rx: LatLon,
    elevation: &dyn ElevationProvider,
    params: &LinkParams,
) -> Result<HopResult> {
    analyze_path_with_events(tx, rx, elevation, params, &mut NullRfSink)
}

pub fn analyze_path_with_events(
    tx: LatLon,
    rx: LatLon,
    elevation: &dyn ElevationProvider,
    params: &LinkParams,
    sink: &mut dyn RfEventSink,
) -> Result<HopResult> {
    let distance_m = haversine_distance_m(tx, rx);
    let num_samples = profile_sample_count(distance_m);
    let result = analyze_path_with_samples(tx, rx, elevation, params, num_samples)?;
    sink.notify(RfEvent::HopAnalyzed { hop_index: 0, total_hops: 1 });
    sink.notify(RfEvent::AnalysisComplete);
    Ok(result)
}

pub fn analyze_path_with_samples(
    tx: LatLon,
    rx: LatLon,
    elevation: &dyn ElevationProvider,
    params: &LinkParams,
    num_samples: usize,
) -> Result<HopResult> {
    let distance_m = haversine_distance_m(tx, rx);
    if distance_m < MIN_DISTANCE_M || distance_m > MAX_DISTANCE_M {
        return Err(RfError::GeometryInvalid { distance_m }.into());
    }
    let bearing_deg = forward_bearing_deg(tx, rx);

    let mut profile = build_profile(tx, rx, elevation, num_samples)?;

    let tx_ground_m = profile.samples.first().map(|s| s.elevation_m).unwrap_or(0.0);
    let rx_ground_m = profile.samples.last().map(|s| s.elevation_m).unwrap_or(0.0);
    let tx_height_m = tx_ground_m + params.tx_antenna_height_m;
    let rx_height_m = rx_ground_m + params.rx_antenna_height_m;

    profile.points =
        analyze_profile_points(&profile.samples, profile.total_distance_m, tx_height_m, rx_height_m, params.freq_hz);

    let worst_percent = worst_interior_clearance_percent(&profile.points);
    let obstructions = direct_obstructions(&profile.points);
    let status = if !obstructions.is_empty() {
        HopStatus::Obstructed
    } else if worst_percent >= FIRST_FRESNEL_CLEAR_PERCENT {
        HopStatus::Clear
    } else {
        HopStatus::Marginal
    };
    let is_obstructed = status == HopStatus::Obstructed;

    let (diffraction_loss_db, diffraction_obstacles) = deygout_analysis(
        &profile.samples,
        tx_height_m,
        rx_height_m,
        0.0,
        profile.total_distance_m,
        profile.total_distance_m,
        params.freq_hz,
    );

    let fspl_db = free_space_path_loss_db(distance_m, params.freq_hz);
    let total_path_loss_db = fspl_db + diffraction_loss_db;
    let rx_power_dbm = received_power_dbm(
        params.tx_power_dbm,
        params.tx_gain_dbi,
        params.rx_gain_dbi,
        total_path_loss_db,
        params.misc_losses_db,
    );

    let eirp_dbm = params.tx_power_dbm + params.tx_gain_dbi;
    let margin_db = rx_power_dbm - params.rx_sensitivity_dbm;
    let link_budget = LinkBudget {
        eirp_dbm,
        received_power_dbm: rx_power_dbm,
        margin_db,
        viable: margin_db >= 0.0,
    };

    Ok(HopResult {
        distance_m,
        bearing_deg,
        profile,
        fresnel_clearance_fraction: worst_percent / 100.0,
        status,
        is_obstructed,
        obstructions,
        diffraction_obstacles,
        diffraction_loss_db,
        free_space_path_loss_db: fspl_db,
        total_path_loss_db,
        received_power_dbm: rx_power_dbm,
        link_budget,
    })
}
