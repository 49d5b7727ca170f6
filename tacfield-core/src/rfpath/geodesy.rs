//! Geodesy and link-budget primitives (`spec.md` §4.G).

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const K_FACTOR: f64 = 4.0 / 3.0;
const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// Convert feet (the elevation provider's unit) to meters.
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / 3.28084
}

/// A WGS84-ish lat/lon point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

/// Great-circle distance between two points, in meters.
pub fn haversine_distance_m(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let dlat = (b.lat_deg - a.lat_deg).to_radians();
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial forward bearing from `a` to `b`, in degrees clockwise from north,
/// normalized to `[0, 360)`.
pub fn forward_bearing_deg(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Earth-curvature drop at distance `d1_m` along a path of total length
/// `total_distance_m`, using the 4/3 K-factor effective-earth-radius model.
pub fn earth_curvature_drop_m(d1_m: f64, total_distance_m: f64) -> f64 {
    let d2_m = total_distance_m - d1_m;
    (d1_m * d2_m) / (2.0 * K_FACTOR * EARTH_RADIUS_M)
}

/// Earth-curvature drop of a point `distance_m` from a single observer
/// (as opposed to [`earth_curvature_drop_m`], which is symmetric between
/// two path ends). Used by the viewshed radial sweep.
pub fn curvature_drop_from_observer_m(distance_m: f64) -> f64 {
    (distance_m * distance_m) / (2.0 * K_FACTOR * EARTH_RADIUS_M)
}

/// First Fresnel zone radius at a point `d1_m` from one end of a path of
/// total length `total_distance_m`, for wavelength implied by `freq_hz`.
pub fn fresnel_radius_m(d1_m: f64, total_distance_m: f64, freq_hz: f64) -> f64 {
    let d2_m = total_distance_m - d1_m;
    let wavelength_m = SPEED_OF_LIGHT_M_PER_S / freq_hz;
    (wavelength_m * d1_m * d2_m / total_distance_m).sqrt()
}

/// Free-space path loss in dB for a link of `distance_m` at `freq_hz`.
pub fn free_space_path_loss_db(distance_m: f64, freq_hz: f64) -> f64 {
    if distance_m <= 0.0 || freq_hz <= 0.0 {
        return f64::INFINITY;
    }
    20.0 * distance_m.log10() + 20.0 * freq_hz.log10() - 147.55
}

/// A point a `fraction` of the way along the great-circle arc from `a` to
/// `b` (0.0 = `a`, 1.0 = `b`), via spherical linear interpolation.
pub fn intermediate_point(a: LatLon, b: LatLon, fraction: f64) -> LatLon {
    let angular_distance = haversine_distance_m(a, b) / EARTH_RADIUS_M;
    if angular_distance < 1e-12 {
        return a;
    }

    let lat1 = a.lat_deg.to_radians();
    let lon1 = a.lon_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let lon2 = b.lon_deg.to_radians();

    let sin_d = angular_distance.sin();
    let coeff_a = ((1.0 - fraction) * angular_distance).sin() / sin_d;
    let coeff_b = (fraction * angular_distance).sin() / sin_d;

    let x = coeff_a * lat1.cos() * lon1.cos() + coeff_b * lat2.cos() * lon2.cos();
    let y = coeff_a * lat1.cos() * lon1.sin() + coeff_b * lat2.cos() * lon2.sin();
    let z = coeff_a * lat1.sin() + coeff_b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    LatLon { lat_deg: lat.to_degrees(), lon_deg: lon.to_degrees() }
}

/// Link budget: received power in dBm given transmit power, antenna gains,
/// cable/connector losses, and the computed path loss, all in dB/dBm/dBi.
pub fn received_power_dbm(
    tx_power_dbm: f64,
    tx_gain_dbi: f64,
    rx_gain_dbi: f64,
    path_loss_db: f64,
    misc_losses_db: f64,
) -> f64 {
    tx_power_dbm + tx_gain_dbi + rx_gain_dbi - path_loss_db - misc_losses_db
}
