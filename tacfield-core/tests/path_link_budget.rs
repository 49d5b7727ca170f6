//! End-to-end link-budget scenarios: obstructed vs. clear paths, and
//! sensitivity of received power to antenna height (`spec.md` §4.I, §8).

use tacfield_core::rfpath::terrain::GridElevationProvider;
use tacfield_core::rfpath::{analyze_path, LatLon, LinkParams};

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
fn a_tall_ridge_midway_obstructs_an_otherwise_clear_path() {
    let tx = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
    let rx = LatLon { lat_deg: 40.2, lon_deg: -105.0 };

    let flat = GridElevationProvider::flat(1000.0);
    let clear = analyze_path(tx, rx, &flat, &default_params()).unwrap();
    assert!(!clear.is_obstructed);

    let ridge = GridElevationProvider::new(vec![
        (LatLon { lat_deg: 40.0, lon_deg: -105.0 }, 1000.0),
        (LatLon { lat_deg: 40.1, lon_deg: -105.0 }, 8000.0),
        (LatLon { lat_deg: 40.2, lon_deg: -105.0 }, 1000.0),
    ]);
    let obstructed = analyze_path(tx, rx, &ridge, &default_params()).unwrap();
    assert!(obstructed.is_obstructed, "clearance={}", obstructed.fresnel_clearance_fraction);
    assert!(obstructed.diffraction_loss_db > clear.diffraction_loss_db);
    assert!(obstructed.received_power_dbm < clear.received_power_dbm);
}

#[test]
fn raising_antenna_height_improves_clearance_over_a_marginal_obstruction() {
    let tx = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
    let rx = LatLon { lat_deg: 40.1, lon_deg: -105.0 };
    let ridge = GridElevationProvider::new(vec![
        (LatLon { lat_deg: 40.0, lon_deg: -105.0 }, 1000.0),
        (LatLon { lat_deg: 40.05, lon_deg: -105.0 }, 1100.0),
        (LatLon { lat_deg: 40.1, lon_deg: -105.0 }, 1000.0),
    ]);

    let mut low_mast = default_params();
    low_mast.tx_antenna_height_m = 2.0;
    low_mast.rx_antenna_height_m = 2.0;

    let mut tall_mast = default_params();
    tall_mast.tx_antenna_height_m = 60.0;
    tall_mast.rx_antenna_height_m = 60.0;

    let low = analyze_path(tx, rx, &ridge, &low_mast).unwrap();
    let tall = analyze_path(tx, rx, &ridge, &tall_mast).unwrap();
    assert!(tall.fresnel_clearance_fraction > low.fresnel_clearance_fraction);
}

#[test]
fn total_path_loss_is_the_sum_of_free_space_and_diffraction_components() {
    let tx = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
    let rx = LatLon { lat_deg: 40.1, lon_deg: -105.0 };
    let flat = GridElevationProvider::flat(1000.0);
    let result = analyze_path(tx, rx, &flat, &default_params()).unwrap();
    let expected = result.free_space_path_loss_db + result.diffraction_loss_db;
    assert!((result.total_path_loss_db - expected).abs() < 1e-9);
}
