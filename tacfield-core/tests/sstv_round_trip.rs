//! Image round-trip fidelity across the mode table (`spec.md` §8).

use tacfield_core::sstv::events::NullSink;
use tacfield_core::sstv::{mode_by_name, DecoderPhase, Raster, SstvEngine};

fn test_raster(width: usize, height: usize) -> Raster {
    let mut raster = Raster::new(width, height);
    for y in 0..height {
        for x in 0..width {
            raster.set_rgb(x, y, [((x * 5 + y) % 256) as u8, ((y * 11) % 256) as u8, ((x * 3) % 256) as u8]);
        }
    }
    raster
}

fn round_trip(mode_name: &str, max_mean_error: f64) {
    let mode = mode_by_name(mode_name).unwrap();
    let original = test_raster(mode.width, mode.height);

    let mut tx = SstvEngine::new(48_000.0, 30_000, NullSink);
    let audio = tx.transmit(mode, &original);

    let mut rx = SstvEngine::new(48_000.0, 30_000, NullSink);
    rx.start_receive();
    rx.push_samples(&audio);

    let state = rx.get_state();
    assert_eq!(state.phase, DecoderPhase::Complete, "{mode_name} failed to complete decode");

    let decoded = rx.take_raster().expect("raster should be present once complete");
    let error = original.mean_abs_rgb_error(&decoded);
    assert!(error <= max_mean_error, "{mode_name}: mean abs RGB error {error} exceeds {max_mean_error}");
}

#[test]
fn robot36_round_trip_is_faithful() {
    round_trip("Robot36", 6.0);
}

#[test]
fn martin_m1_round_trip_is_faithful() {
    round_trip("MartinM1", 6.0);
}

#[test]
fn scottie_s1_round_trip_is_faithful() {
    round_trip("ScottieS1", 6.0);
}

#[test]
fn pd90_round_trip_is_faithful() {
    round_trip("PD90", 6.0);
}

#[test]
fn wraase_sc2_180_round_trip_is_faithful() {
    round_trip("WraaseSC2180", 6.0);
}
