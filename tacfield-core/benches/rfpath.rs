use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tacfield_core::rfpath::{
    analyze_path, analyze_viewshed, GridElevationProvider, LatLon, LinkParams, ViewshedResolution,
};

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

fn benchmark_analyze_path(c: &mut Criterion) {
    let tx = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
    let rx = LatLon { lat_deg: 40.2, lon_deg: -105.0 };
    let elevation = GridElevationProvider::flat(5000.0);
    let params = default_params();

    c.bench_function("analyze_path_flat_terrain", |b| {
        b.iter(|| black_box(analyze_path(black_box(tx), black_box(rx), &elevation, &params)))
    });
}

fn benchmark_viewshed_by_radial_count(c: &mut Criterion) {
    let origin = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
    let elevation = GridElevationProvider::flat(5000.0);

    let mut group = c.benchmark_group("viewshed");
    for resolution in [ViewshedResolution::Low, ViewshedResolution::Medium, ViewshedResolution::High] {
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution.radial_count()),
            &resolution,
            |b, &resolution| {
                b.iter(|| {
                    black_box(analyze_viewshed(origin, 5000.0, resolution, 10.0, 2.0, 146_000_000.0, &elevation))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_analyze_path, benchmark_viewshed_by_radial_count);
criterion_main!(benches);
