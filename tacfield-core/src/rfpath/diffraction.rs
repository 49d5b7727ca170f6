//! Knife-edge diffraction: the Fresnel-Kirchhoff parameter, ITU-R P.526-15
//! diffraction loss, and recursive Deygout multi-edge analysis
//! (`spec.md` §4.H).

use super::geodesy::earth_curvature_drop_m;
use super::terrain::TerrainSample;

const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// The Fresnel-Kirchhoff diffraction parameter `v` for an obstruction of
/// height `h_m` above the direct line of sight, at distances `d1_m`/`d2_m`
/// from each end of the path.
pub fn fresnel_kirchhoff_v(h_m: f64, d1_m: f64, d2_m: f64, freq_hz: f64) -> f64 {
    let wavelength_m = SPEED_OF_LIGHT_M_PER_S / freq_hz;
    h_m * (2.0 / wavelength_m * (1.0 / d1_m + 1.0 / d2_m)).sqrt()
}

/// ITU-R P.526-15 single knife-edge diffraction loss, in dB, as a function
/// of `v`. Zero (no loss) for `v <= -0.78`.
pub fn diffraction_loss_db(v: f64) -> f64 {
    if v <= -0.78 {
        return 0.0;
    }
    6.9 + 20.0 * (((v - 0.1).powi(2) + 1.0).sqrt() + v - 0.1).log10()
}

/// Height of the straight line between the transmit and receive antennas
/// (absolute elevation, meters) at distance `d_m` from the transmitter.
fn line_of_sight_height_m(tx_height_m: f64, rx_height_m: f64, d_m: f64, total_distance_m: f64) -> f64 {
    if total_distance_m <= 0.0 {
        return tx_height_m;
    }
    tx_height_m + (rx_height_m - tx_height_m) * d_m / total_distance_m
}

/// Terrain height above the line of sight at a sample, including the
/// Earth-curvature bulge.
fn obstruction_height_m(
    sample: TerrainSample,
    tx_height_m: f64,
    rx_height_m: f64,
    total_distance_m: f64,
) -> f64 {
    let los = line_of_sight_height_m(tx_height_m, rx_height_m, sample.distance_m, total_distance_m);
    let bulge = earth_curvature_drop_m(sample.distance_m, total_distance_m);
    sample.elevation_m + bulge - los
}

/// One scored Deygout edge: the dominant obstruction found at one level of
/// the recursion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffractionObstacle {
    pub distance_m: f64,
    pub height_above_los_m: f64,
    pub v: f64,
    pub loss_db: f64,
}

/// Recursively apply the Deygout method over `profile` between the
/// transmitter (absolute height `tx_height_m`, at `tx_distance_m` along the
/// full path) and the receiver (`rx_height_m` at `rx_distance_m`).
///
/// Finds the sample within `(tx_distance_m, rx_distance_m)` with the
/// largest Fresnel-Kirchhoff `v`, scores it as the dominant obstruction,
/// then recurses on the sub-paths either side of it. Returns the summed
/// diffraction loss in dB; zero if no obstructing sample is found.
pub fn deygout_loss_db(
    profile: &[TerrainSample],
    tx_height_m: f64,
    rx_height_m: f64,
    tx_distance_m: f64,
    rx_distance_m: f64,
    total_distance_m: f64,
    freq_hz: f64,
) -> f64 {
    deygout_analysis(profile, tx_height_m, rx_height_m, tx_distance_m, rx_distance_m, total_distance_m, freq_hz).0
}

/// Same as [`deygout_loss_db`] but also returns every scored obstacle, in
/// the order they were found across the recursion (dominant edge at each
/// level first, then its left and right sub-paths).
pub fn deygout_analysis(
    profile: &[TerrainSample],
    tx_height_m: f64,
    rx_height_m: f64,
    tx_distance_m: f64,
    rx_distance_m: f64,
    total_distance_m: f64,
    freq_hz: f64,
) -> (f64, Vec<DiffractionObstacle>) {
    deygout_analysis_at_depth(
        profile,
        tx_height_m,
        rx_height_m,
        tx_distance_m,
        rx_distance_m,
        total_distance_m,
        freq_hz,
        0,
    )
}

/// Recursion depth is capped at 3 (`spec.md` §3/§4.H invariant): once
/// `depth` reaches the cap, the dominant obstacle at this level is still
/// scored but no further sub-path recursion happens.
const MAX_DEYGOUT_DEPTH: u32 = 3;

fn deygout_analysis_at_depth(
    profile: &[TerrainSample],
    tx_height_m: f64,
    rx_height_m: f64,
    tx_distance_m: f64,
    rx_distance_m: f64,
    total_distance_m: f64,
    freq_hz: f64,
    depth: u32,
) -> (f64, Vec<DiffractionObstacle>) {
    let dominant = profile
        .iter()
        .filter(|s| s.distance_m > tx_distance_m && s.distance_m < rx_distance_m)
        .map(|&s| {
            let h = obstruction_height_m(s, tx_height_m, rx_height_m, total_distance_m);
            let d1 = s.distance_m - tx_distance_m;
            let d2 = rx_distance_m - s.distance_m;
            let v = fresnel_kirchhoff_v(h, d1, d2, freq_hz);
            (s, h, v)
        })
        .max_by(|(_, _, v1), (_, _, v2)| v1.partial_cmp(v2).unwrap());

    let Some((main_sample, main_height_above_los, main_v)) = dominant else {
        return (0.0, Vec::new());
    };

    if main_v <= -0.78 {
        return (0.0, Vec::new());
    }

    let main_loss = diffraction_loss_db(main_v);
    let mut obstacles = vec![DiffractionObstacle {
        distance_m: main_sample.distance_m,
        height_above_los_m: main_height_above_los,
        v: main_v,
        loss_db: main_loss,
    }];

    if depth >= MAX_DEYGOUT_DEPTH {
        return (main_loss, obstacles);
    }

    let main_height = main_sample.elevation_m
        + earth_curvature_drop_m(main_sample.distance_m, total_distance_m);

    let (left_loss, left_obstacles) = deygout_analysis_at_depth(
        profile,
        tx_height_m,
        main_height,
        tx_distance_m,
        main_sample.distance_m,
        total_distance_m,
        freq_hz,
        depth + 1,
    );
    let (right_loss, right_obstacles) = deygout_analysis_at_depth(
        profile,
        main_height,
        rx_height_m,
        main_sample.distance_m,
        rx_distance_m,
        total_distance_m,
        freq_hz,
        depth + 1,
    );

    obstacles.extend(left_obstacles);
    obstacles.extend(right_obstacles);
    (main_loss + left_loss + right_loss, obstacles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unobstructed_path_has_zero_loss() {
        // v far below -0.78: obstruction well clear of the Fresnel zone.
        let v = fresnel_kirchhoff_v(-1000.0, 5000.0, 5000.0, 146_000_000.0);
        assert_eq!(diffraction_loss_db(v), 0.0);
    }

    #[test]
    fn grazing_obstruction_gives_about_6db() {
        // v = 0 is the classic "knife edge grazes the direct path" case.
        assert_relative_eq!(diffraction_loss_db(0.0), 6.02, epsilon = 0.1);
    }

    #[test]
    fn loss_increases_with_v() {
        let low = diffraction_loss_db(0.5);
        let high = diffraction_loss_db(2.0);
        assert!(high > low);
    }

    #[test]
    fn deygout_with_no_obstructions_is_zero() {
        let profile = vec![
            TerrainSample { distance_m: 1000.0, elevation_m: 50.0 },
            TerrainSample { distance_m: 5000.0, elevation_m: 50.0 },
        ];
        // Antenna masts far above any terrain: no sample should dominate.
        let loss = deygout_loss_db(&profile, 5000.0, 5000.0, 0.0, 10_000.0, 10_000.0, 146_000_000.0);
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn deygout_scores_a_single_central_obstruction() {
        let profile = vec![TerrainSample { distance_m: 5000.0, elevation_m: 500.0 }];
        let loss = deygout_loss_db(&profile, 10.0, 10.0, 0.0, 10_000.0, 10_000.0, 146_000_000.0);
        assert!(loss > 0.0);
    }

    #[test]
    fn deygout_analysis_reports_one_obstacle_per_scored_edge() {
        let profile = vec![
            TerrainSample { distance_m: 3000.0, elevation_m: 400.0 },
            TerrainSample { distance_m: 7000.0, elevation_m: 420.0 },
        ];
        let (loss, obstacles) =
            deygout_analysis(&profile, 10.0, 10.0, 0.0, 10_000.0, 10_000.0, 146_000_000.0);
        assert_eq!(obstacles.len(), 2);
        let total: f64 = obstacles.iter().map(|o| o.loss_db).sum();
        assert!((total - loss).abs() < 1e-9);
    }

    #[test]
    fn deygout_recurses_over_two_obstructions() {
        let profile = vec![
            TerrainSample { distance_m: 3000.0, elevation_m: 400.0 },
            TerrainSample { distance_m: 7000.0, elevation_m: 420.0 },
        ];
        let loss = deygout_loss_db(&profile, 10.0, 10.0, 0.0, 10_000.0, 10_000.0, 146_000_000.0);
        let single_edge = diffraction_loss_db(fresnel_kirchhoff_v(
            obstruction_height_m(profile[1], 10.0, 10.0, 10_000.0),
            7000.0,
            3000.0,
            146_000_000.0,
        ));
        assert!(loss >= single_edge);
    }
}
