//! `rf path` / `rf viewshed` subcommands (`spec.md` §11 supplemented features).

use std::path::Path;

use color_eyre::eyre::Result;

use tacfield_core::rfpath::{
    analyze_path, analyze_viewshed, ElevationProvider, GridElevationProvider, LatLon, LinkParams,
    ViewshedResolution,
};

use crate::logging::{LogEvent, PathAnalyzedEvent, StructuredLogger};
use crate::terrain_grid;

fn elevation_provider(terrain_feet: f64, terrain_file: Option<&Path>) -> Result<Box<dyn ElevationProvider + Sync>> {
    match terrain_file {
        Some(path) => Ok(Box::new(terrain_grid::load_grid(path)?)),
        None => Ok(Box::new(GridElevationProvider::flat(terrain_feet))),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn path(
    tx_lat: f64,
    tx_lon: f64,
    rx_lat: f64,
    rx_lon: f64,
    terrain_feet: f64,
    terrain_file: Option<&Path>,
    freq_hz: f64,
    tx_power_dbm: f64,
    rx_sensitivity_dbm: f64,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let tx = LatLon { lat_deg: tx_lat, lon_deg: tx_lon };
    let rx = LatLon { lat_deg: rx_lat, lon_deg: rx_lon };
    let elevation = elevation_provider(terrain_feet, terrain_file)?;

    let params = LinkParams {
        freq_hz,
        tx_power_dbm,
        tx_gain_dbi: 6.0,
        rx_gain_dbi: 6.0,
        tx_antenna_height_m: 10.0,
        rx_antenna_height_m: 10.0,
        misc_losses_db: 2.0,
        rx_sensitivity_dbm,
    };

    let result = analyze_path(tx, rx, elevation.as_ref(), &params)?;

    logger.log(LogEvent::PathAnalyzed(PathAnalyzedEvent {
        distance_m: result.distance_m,
        bearing_deg: result.bearing_deg,
        is_obstructed: result.is_obstructed,
        diffraction_loss_db: result.diffraction_loss_db,
        received_power_dbm: result.received_power_dbm,
    }))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn viewshed(
    lat: f64,
    lon: f64,
    radius_m: f64,
    terrain_feet: f64,
    terrain_file: Option<&Path>,
    resolution: ViewshedResolution,
    freq_hz: f64,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let origin = LatLon { lat_deg: lat, lon_deg: lon };
    let elevation = elevation_provider(terrain_feet, terrain_file)?;

    let result = analyze_viewshed(origin, radius_m, resolution, 10.0, 2.0, freq_hz, elevation.as_ref());
    let num_radials = result.radials.len();

    logger.log(LogEvent::Info {
        message: format!(
            "viewshed around ({lat:.5}, {lon:.5}): {:.1}% visible over {num_radials} radials",
            result.visible_fraction() * 100.0
        ),
    })?;
    Ok(())
}
