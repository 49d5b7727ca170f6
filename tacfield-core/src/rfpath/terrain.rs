//! Terrain sampling (`spec.md` §3 "Terrain sample", §6 elevation provider).

use super::geodesy::LatLon;

/// One elevation sample along a path profile, in meters above the path's
/// distance origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub distance_m: f64,
    pub elevation_m: f64,
}

/// The external elevation source. Implementations return feet (the
/// conventional unit for most terrain-tile providers); callers in this
/// crate convert to meters via [`super::geodesy::feet_to_meters`] at the
/// boundary, never deeper in the analysis pipeline.
pub trait ElevationProvider {
    /// Ground elevation at `point`, in feet above sea level, or `None` if
    /// the point falls outside the provider's coverage.
    fn elevation_feet(&self, point: LatLon) -> Option<f64>;

    /// Ground elevation at every point in `points`, in the same order.
    /// Callers that need elevations for a whole profile or radial sweep
    /// must use this instead of looping `elevation_feet` per point, so a
    /// remote provider only ever sees one request per analysis
    /// (`spec.md` §5/§6: batched elevation fetch bounds tail latency).
    /// The default forwards to `elevation_feet` per point; providers
    /// backed by a real network/tile source should override this with a
    /// genuine batch request.
    fn elevations_feet(&self, points: &[LatLon]) -> Vec<Option<f64>> {
        points.iter().map(|&p| self.elevation_feet(p)).collect()
    }
}

/// An in-memory elevation provider for tests and synthetic fixtures: a flat
/// grid of `(LatLon, feet)` samples with nearest-neighbor lookup.
pub struct GridElevationProvider {
    samples: Vec<(LatLon, f64)>,
}

impl GridElevationProvider {
    pub fn new(samples: Vec<(LatLon, f64)>) -> Self {
        Self { samples }
    }

    /// A provider returning a single constant elevation everywhere,
    /// useful for isolating curvature/Fresnel effects in tests.
    pub fn flat(elevation_feet: f64) -> Self {
        Self { samples: vec![(LatLon { lat_deg: 0.0, lon_deg: 0.0 }, elevation_feet)] }
    }
}

impl ElevationProvider for GridElevationProvider {
    fn elevation_feet(&self, point: LatLon) -> Option<f64> {
        if self.samples.len() == 1 {
            return Some(self.samples[0].1);
        }
        self.samples
            .iter()
            .min_by(|(a, _), (b, _)| {
                let da = (a.lat_deg - point.lat_deg).powi(2) + (a.lon_deg - point.lon_deg).powi(2);
                let db = (b.lat_deg - point.lat_deg).powi(2) + (b.lon_deg - point.lon_deg).powi(2);
                da.partial_cmp(&db).unwrap()
            })
            .map(|(_, feet)| *feet)
    }
}

/// Linearly interpolate elevation at `distance_m` between two bracketing
/// samples. `samples` must be sorted by `distance_m`.
pub fn interpolate_elevation_m(samples: &[TerrainSample], distance_m: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if distance_m <= samples[0].distance_m {
        return samples[0].elevation_m;
    }
    if distance_m >= samples[samples.len() - 1].distance_m {
        return samples[samples.len() - 1].elevation_m;
    }

    for window in samples.windows(2) {
        let (a, b) = (window[0], window[1]);
        if distance_m >= a.distance_m && distance_m <= b.distance_m {
            let span = b.distance_m - a.distance_m;
            if span <= 0.0 {
                return a.elevation_m;
            }
            let t = (distance_m - a.distance_m) / span;
            return a.elevation_m + t * (b.elevation_m - a.elevation_m);
        }
    }
    samples[samples.len() - 1].elevation_m
}
