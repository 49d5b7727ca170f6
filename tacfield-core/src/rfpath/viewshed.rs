//! Radial viewshed / coverage mapping (`spec.md` §4.K).
//!
//! Every sample point across every radial is fetched from the elevation
//! provider in a single batched call (plus the origin itself), so a remote
//! provider sees exactly one request per sweep regardless of resolution.
//! Classifying the fetched points is then independent per radial, so that
//! step is parallelized across radials with `rayon` (`spec.md` §5
//! concurrency model).

use rayon::prelude::*;

use super::events::{NullRfSink, RfEvent, RfEventSink};
use super::geodesy::{curvature_drop_from_observer_m, feet_to_meters, fresnel_radius_m, LatLon};
use super::path_analyzer::{classify_clearance, HopStatus};
use super::terrain::ElevationProvider;

const MIN_SAMPLES_PER_RADIAL: i64 = 15;
const MAX_SAMPLES_PER_RADIAL: i64 = 40;
const SAMPLE_SPACING_M: f64 = 300.0;

/// The azimuth step of a viewshed sweep, closed over the three resolutions
/// the CLI exposes (`spec.md` §4.K point 1). Kept as a plain enum here;
/// CLI-facing argument parsing wraps it rather than the other way around,
/// so this crate doesn't need to depend on `clap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ViewshedResolution {
    Low,
    Medium,
    High,
}

impl ViewshedResolution {
    /// Degrees between adjacent radials.
    pub fn azimuth_step_deg(self) -> f64 {
        match self {
            ViewshedResolution::Low => 20.0,
            ViewshedResolution::Medium => 10.0,
            ViewshedResolution::High => 5.0,
        }
    }

    /// Number of evenly spaced radials implied by the azimuth step.
    pub fn radial_count(self) -> usize {
        (360.0 / self.azimuth_step_deg()).round() as usize
    }
}

/// `clamp(15, 40, ceil(radius_m / 300))` (`spec.md` §4.K point 1).
pub fn samples_per_radial_for(radius_m: f64) -> usize {
    let raw = (radius_m / SAMPLE_SPACING_M).ceil() as i64;
    raw.clamp(MIN_SAMPLES_PER_RADIAL, MAX_SAMPLES_PER_RADIAL) as usize
}

/// One sample point along a viewshed radial, classified exactly as a path
/// analysis sample would be (`spec.md` §4.I, reused per §4.K).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewshedPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub distance_m: f64,
    pub terrain_elevation_m: f64,
    pub clearance_m: f64,
    pub clearance_percent_of_first_fresnel: f64,
    pub status: HopStatus,
    pub visible: bool,
}

/// One radial's full sweep out to the sweep radius.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialResult {
    pub bearing_deg: f64,
    pub points: Vec<ViewshedPoint>,
    /// Smallest distance along this radial at which a sample was blocked;
    /// `None` if the whole radial stayed clear or marginal out to the full
    /// sweep radius (`spec.md` §3 "Viewshed result").
    pub los_reached_m: Option<f64>,
}

/// The full result of a radial viewshed sweep around one origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewshedResult {
    pub origin: LatLon,
    pub radials: Vec<RadialResult>,
}

impl ViewshedResult {
    /// Fraction of all sampled points that are visible from the origin.
    pub fn visible_fraction(&self) -> f64 {
        let mut total = 0usize;
        let mut visible = 0usize;
        for radial in &self.radials {
            for point in &radial.points {
                total += 1;
                if point.visible {
                    visible += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            visible as f64 / total as f64
        }
    }
}

/// Destination point `distance_m` out from `origin` along `bearing_deg`
/// (degrees clockwise from north), on the surface of a spherical Earth.
fn destination_point(origin: LatLon, bearing_deg: f64, distance_m: f64) -> LatLon {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let angular_distance = distance_m / EARTH_RADIUS_M;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.lat_deg.to_radians();
    let lon1 = origin.lon_deg.to_radians();

    let lat2 = (lat1.sin() * angular_distance.cos() + lat1.cos() * angular_distance.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular_distance.sin() * lat1.cos())
            .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

    LatLon { lat_deg: lat2.to_degrees(), lon_deg: lon2.to_degrees() }
}

/// Classify one already-fetched radial: a cumulative horizon test (each
/// point compared against the line-of-sight implied by the best angle seen
/// so far) refined into clear/marginal/blocked via the same Fresnel
/// clearance percentage used for path analysis.
fn classify_radial(
    origin_points: &[LatLon],
    feet: &[Option<f64>],
    bearing_deg: f64,
    radius_m: f64,
    samples_per_radial: usize,
    observer_elevation_m: f64,
    target_height_m: f64,
    freq_hz: f64,
) -> RadialResult {
    let mut prevailing_angle = f64::NEG_INFINITY;
    let mut points = Vec::with_capacity(samples_per_radial);
    let mut los_reached_m = None;
    let mut previous_elevation_m = 0.0;

    for (i, (&point, sample_feet)) in origin_points.iter().zip(feet.iter()).enumerate() {
        let distance_m = radius_m * (i + 1) as f64 / samples_per_radial as f64;
        let terrain_elevation_m = match sample_feet {
            Some(ft) => {
                let m = feet_to_meters(*ft);
                previous_elevation_m = m;
                m
            }
            None => previous_elevation_m,
        };

        let bulge = curvature_drop_from_observer_m(distance_m);
        let ground_after_curvature_m = terrain_elevation_m - bulge;
        let target_elevation_m = ground_after_curvature_m + target_height_m;
        let angle = (target_elevation_m - observer_elevation_m) / distance_m;

        let radius = fresnel_radius_m(distance_m / 2.0, distance_m, freq_hz).max(1e-9);
        let los_height_m = observer_elevation_m + prevailing_angle * distance_m;
        let clearance_m = target_elevation_m - los_height_m;
        let clearance_percent = if clearance_m.is_infinite() {
            clearance_m
        } else {
            100.0 * clearance_m / radius
        };

        let status = classify_clearance(clearance_m, clearance_percent);
        let visible = status != HopStatus::Obstructed;
        if visible {
            prevailing_angle = angle;
        } else if los_reached_m.is_none() {
            los_reached_m = Some(distance_m);
        }

        points.push(ViewshedPoint {
            lat_deg: point.lat_deg,
            lon_deg: point.lon_deg,
            distance_m,
            terrain_elevation_m,
            clearance_m,
            clearance_percent_of_first_fresnel: clearance_percent,
            status,
            visible,
        });
    }

    RadialResult { bearing_deg, points, los_reached_m }
}

/// Sweep a full circle of radials out to `radius_m` from `origin`
/// (`spec.md` §6 `analyze_viewshed`).
pub fn analyze_viewshed(
    origin: LatLon,
    radius_m: f64,
    resolution: ViewshedResolution,
    observer_height_m: f64,
    target_height_m: f64,
    freq_hz: f64,
    elevation: &(dyn ElevationProvider + Sync),
) -> ViewshedResult {
    analyze_viewshed_with_events(
        origin,
        radius_m,
        resolution,
        observer_height_m,
        target_height_m,
        freq_hz,
        elevation,
        &mut NullRfSink,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn analyze_viewshed_with_events(
    origin: LatLon,
    radius_m: f64,
    resolution: ViewshedResolution,
    observer_height_m: f64,
    target_height_m: f64,
    freq_hz: f64,
    elevation: &(dyn ElevationProvider + Sync),
    sink: &mut dyn RfEventSink,
) -> ViewshedResult {
    let num_radials = resolution.radial_count();
    let samples_per_radial = samples_per_radial_for(radius_m);
    let bearings: Vec<f64> = (0..num_radials).map(|i| 360.0 * i as f64 / num_radials as f64).collect();

    let radial_points: Vec<Vec<LatLon>> = bearings
        .iter()
        .map(|&bearing_deg| {
            (1..=samples_per_radial)
                .map(|s| destination_point(origin, bearing_deg, radius_m * s as f64 / samples_per_radial as f64))
                .collect()
        })
        .collect();

    let mut all_points = Vec::with_capacity(1 + num_radials * samples_per_radial);
    all_points.push(origin);
    for points in &radial_points {
        all_points.extend(points.iter().copied());
    }

    let all_feet = elevation.elevations_feet(&all_points);
    sink.notify(RfEvent::Progress { percent: 10.0 });

    let observer_elevation_m = feet_to_meters(all_feet[0].unwrap_or(0.0)) + observer_height_m;

    let radials: Vec<RadialResult> = radial_points
        .into_par_iter()
        .enumerate()
        .map(|(i, points)| {
            let start = 1 + i * samples_per_radial;
            let feet = &all_feet[start..start + samples_per_radial];
            classify_radial(
                &points,
                feet,
                bearings[i],
                radius_m,
                samples_per_radial,
                observer_elevation_m,
                target_height_m,
                freq_hz,
            )
        })
        .collect();

    for i in 0..num_radials {
        sink.notify(RfEvent::RadialCompleted { radial_index: i, total_radials: num_radials });
        let percent = 20.0 + 75.0 * (i + 1) as f64 / num_radials as f64;
        sink.notify(RfEvent::Progress { percent });
    }
    sink.notify(RfEvent::AnalysisComplete);

    ViewshedResult { origin, radials }
}
