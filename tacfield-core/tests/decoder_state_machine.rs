//! Decoder phase-transition behavior (`spec.md` §4.D, §8).

use tacfield_core::sstv::events::{ChannelSink, NullSink, SstvEvent};
use tacfield_core::sstv::synth::ToneSynthesizer;
use tacfield_core::sstv::vis::Tone;
use tacfield_core::sstv::{mode_by_name, DecoderPhase, Raster, SstvEngine};

const SAMPLE_RATE_HZ: f64 = 48_000.0;

/// A bare 1900 Hz leader tone, long enough to satisfy the Goertzel idle gate,
/// with no VIS code following it.
fn leader_tone() -> Vec<f32> {
    let mut synth = ToneSynthesizer::new(SAMPLE_RATE_HZ);
    synth.render(&[Tone { freq_hz: 1900.0, duration_ms: 50.0 }])
}

#[test]
fn idle_is_the_initial_state() {
    let engine = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
}

#[test]
fn start_receive_alone_does_not_leave_idle() {
    let mut engine = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    engine.start_receive();
    assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
}

#[test]
fn a_leader_tone_moves_idle_to_awaiting_vis() {
    let mut engine = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    engine.start_receive();
    engine.push_samples(&leader_tone());
    assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
}

#[test]
fn stop_receive_returns_to_idle_from_any_phase() {
    let mut engine = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    engine.start_receive();
    engine.push_samples(&leader_tone());
    assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
    engine.stop_receive();
    assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
}

#[test]
fn idle_engine_drops_samples_without_state_change() {
    let mut engine = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    engine.push_samples(&[0.1, -0.1, 0.2]);
    assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    assert_eq!(engine.get_state().rows_decoded, 0);
}

#[test]
fn full_phase_sequence_is_awaiting_vis_then_receiving_then_complete() {
    let (sink, receiver) = ChannelSink::new(4096);
    let mode = mode_by_name("Robot36").unwrap();
    let raster = Raster::new(mode.width, mode.height);

    let mut tx = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    let audio = tx.transmit(mode, &raster);

    let mut rx = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, sink);
    rx.start_receive();
    // A transmitted frame starts with its own VIS preamble leader tone, so
    // pushing the whole thing in one shot exercises the idle gate too.
    rx.push_samples(&audio);

    assert_eq!(rx.get_state().phase, DecoderPhase::Complete);

    let events: Vec<SstvEvent> = receiver.try_iter().collect();
    let saw_vis_detected = events.iter().any(|e| matches!(e, SstvEvent::VisDetected { .. }));
    let saw_frame_complete = events.iter().any(|e| matches!(e, SstvEvent::FrameComplete { .. }));
    assert!(saw_vis_detected, "expected a VisDetected event");
    assert!(saw_frame_complete, "expected a FrameComplete event");
}

#[test]
fn complete_engine_ignores_further_samples() {
    let mode = mode_by_name("Robot36").unwrap();
    let raster = Raster::new(mode.width, mode.height);
    let mut tx = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    let audio = tx.transmit(mode, &raster);

    let mut rx = SstvEngine::new(SAMPLE_RATE_HZ, 30_000, NullSink);
    rx.start_receive();
    rx.push_samples(&audio);
    assert_eq!(rx.get_state().phase, DecoderPhase::Complete);

    let rows_before = rx.get_state().rows_decoded;
    rx.push_samples(&vec![0.0f32; 1000]);
    assert_eq!(rx.get_state().rows_decoded, rows_before);
    assert_eq!(rx.get_state().phase, DecoderPhase::Complete);
}

#[test]
fn vis_timeout_returns_the_engine_to_idle_so_a_new_leader_tone_can_arm_it() {
    let (sink, receiver) = ChannelSink::new(32);
    let mut engine = SstvEngine::new(SAMPLE_RATE_HZ, 10, sink);
    engine.start_receive();
    engine.push_samples(&leader_tone());
    assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);

    engine.push_samples(&vec![0.0f32; SAMPLE_RATE_HZ as usize]);
    assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    let events: Vec<SstvEvent> = receiver.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, SstvEvent::VisTimedOut { .. })));

    engine.push_samples(&leader_tone());
    assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
}
