//! Phase-continuous tone synthesis (`spec.md` §4.F).
//!
//! Phase is tracked as a running scalar advanced by `2*pi*f/fs` each sample
//! and wrapped into `[0, 2*pi)`; it is never reconstructed via `arcsin`,
//! which loses the sign and quadrant of the instantaneous phase and would
//! reintroduce the clicks this design exists to avoid.

use std::f64::consts::TAU;

use super::vis::Tone;

/// A running-phase oscillator. Reusing one instance across an entire
/// transmission (VIS preamble, sync pulses, scan lines) guarantees no phase
/// discontinuity at tone boundaries.
pub struct ToneSynthesizer {
    sample_rate_hz: f64,
    phase: f64,
}

impl ToneSynthesizer {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self { sample_rate_hz, phase: 0.0 }
    }

    /// Current phase in radians, always in `[0, 2*pi)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Render `duration_ms` of a `freq_hz` tone, advancing the internal
    /// phase continuously from wherever the previous call left it.
    pub fn tone(&mut self, freq_hz: f64, duration_ms: f64) -> Vec<f32> {
        let n = (self.sample_rate_hz * duration_ms / 1000.0).round() as usize;
        let step = TAU * freq_hz / self.sample_rate_hz;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.phase.sin() as f32);
            self.phase = (self.phase + step) % TAU;
        }
        out
    }

    /// Render a sequence of tones back to back, phase-continuous across the
    /// whole sequence.
    pub fn render(&mut self, tones: &[Tone]) -> Vec<f32> {
        let mut out = Vec::new();
        for tone in tones {
            out.extend(self.tone(tone.freq_hz, tone.duration_ms));
        }
        out
    }
}
