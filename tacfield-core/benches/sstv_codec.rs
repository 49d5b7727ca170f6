use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tacfield_core::sstv::{mode_by_name, vis, Raster, SstvEngine};
use tacfield_core::sstv::events::NullSink;

fn filled_raster(width: usize, height: usize) -> Raster {
    let mut raster = Raster::new(width, height);
    for y in 0..height {
        for x in 0..width {
            raster.set_rgb(x, y, [((x * 7) % 256) as u8, ((y * 3) % 256) as u8, 128]);
        }
    }
    raster
}

fn benchmark_vis_round_trip(c: &mut Criterion) {
    c.bench_function("vis_generate_then_decode", |b| {
        b.iter(|| {
            let tones = vis::generate_vis_preamble(black_box(0x08));
            let mut synth = tacfield_core::sstv::synth::ToneSynthesizer::new(48_000.0);
            let audio = synth.render(&tones);
            black_box(vis::try_decode_vis(&audio, 48_000.0))
        })
    });
}

fn benchmark_transmit_by_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transmit");
    for mode_name in ["Robot36", "MartinM1", "PD90"] {
        let mode = mode_by_name(mode_name).unwrap();
        let raster = filled_raster(mode.width, mode.height);
        group.bench_with_input(BenchmarkId::from_parameter(mode_name), mode_name, |b, _| {
            b.iter(|| {
                let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
                black_box(engine.transmit(mode, black_box(&raster)))
            })
        });
    }
    group.finish();
}

fn benchmark_round_trip_decode(c: &mut Criterion) {
    let mode = mode_by_name("Robot36").unwrap();
    let raster = filled_raster(mode.width, mode.height);
    let mut tx = SstvEngine::new(48_000.0, 30_000, NullSink);
    let audio = tx.transmit(mode, &raster);

    c.bench_function("robot36_full_decode", |b| {
        b.iter(|| {
            let mut rx = SstvEngine::new(48_000.0, 30_000, NullSink);
            rx.start_receive();
            rx.push_samples(black_box(&audio));
            black_box(rx.get_state())
        })
    });
}

criterion_group!(benches, benchmark_vis_round_trip, benchmark_transmit_by_mode, benchmark_round_trip_decode);
criterion_main!(benches);
