//! Single-bin tone analysis: Goertzel power and dominant-frequency search
//! (`spec.md` §4.A).

use num_complex::Complex64;
use std::f64::consts::TAU;

use crate::utils::lerp_clamped;

/// Goertzel single-bin power at `target_hz` over `samples`, sampled at
/// `sample_rate_hz`.
///
/// Runs the real second-order recurrence `s0 = x + coeff*s1 - s2`, then
/// folds the last two states through the complex twiddle factor
/// `w = e^{-i*2*pi*k/N}` to get the bin's complex amplitude; the power is
/// that amplitude's squared norm.
pub fn power_at(samples: &[f32], target_hz: f64, sample_rate_hz: f64) -> f64 {
    let n = samples.len();
    if n == 0 || sample_rate_hz <= 0.0 {
        return 0.0;
    }

    let k = (target_hz * n as f64 / sample_rate_hz).round();
    let w = TAU * k / n as f64;
    let coeff = 2.0 * w.cos();

    let mut s1 = 0.0_f64;
    let mut s2 = 0.0_f64;
    for &sample in samples {
        let s0 = sample as f64 + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }

    let twiddle = Complex64::from_polar(1.0, -w);
    let result = Complex64::new(s1, 0.0) - twiddle * s2;
    result.norm_sqr()
}

/// Coarse-then-fine sweep for the dominant frequency in `[1100, 2400]` Hz.
///
/// A 25 Hz coarse sweep locates the approximate peak, then a +/-30 Hz fine
/// sweep in 5 Hz steps refines it. The refinement is required for
/// sub-step accuracy of VIS bits and color pixels (`spec.md` §4.A).
pub fn dominant_frequency(samples: &[f32], sample_rate_hz: f64) -> (f64, f64) {
    const COARSE_LO: f64 = 1100.0;
    const COARSE_HI: f64 = 2400.0;
    const COARSE_STEP: f64 = 25.0;
    const FINE_SPAN: f64 = 30.0;
    const FINE_STEP: f64 = 5.0;

    let mut best_hz = COARSE_LO;
    let mut best_power = f64::MIN;

    let mut hz = COARSE_LO;
    while hz <= COARSE_HI {
        let power = power_at(samples, hz, sample_rate_hz);
        if power > best_power {
            best_power = power;
            best_hz = hz;
        }
        hz += COARSE_STEP;
    }

    let fine_lo = (best_hz - FINE_SPAN).max(COARSE_LO);
    let fine_hi = (best_hz + FINE_SPAN).min(COARSE_HI);
    let mut hz = fine_lo;
    while hz <= fine_hi {
        let power = power_at(samples, hz, sample_rate_hz);
        if power > best_power {
            best_power = power;
            best_hz = hz;
        }
        hz += FINE_STEP;
    }

    (best_hz, best_power)
}

/// Fine sweep for the sync-tone peak frequency used by drift tracking: a
/// coarse 2 Hz sweep over `[1150, 1250]` Hz, refined to 0.5 Hz near the
/// coarse peak (`spec.md` §4.E).
pub fn sync_peak_frequency(samples: &[f32], sample_rate_hz: f64) -> (f64, f64) {
    const LO: f64 = 1150.0;
    const HI: f64 = 1250.0;
    const COARSE_STEP: f64 = 2.0;
    const FINE_SPAN: f64 = 2.0;
    const FINE_STEP: f64 = 0.5;

    let mut best_hz = LO;
    let mut best_power = f64::MIN;

    let mut hz = LO;
    while hz <= HI {
        let power = power_at(samples, hz, sample_rate_hz);
        if power > best_power {
            best_power = power;
            best_hz = hz;
        }
        hz += COARSE_STEP;
    }

    let fine_lo = (best_hz - FINE_SPAN).max(LO);
    let fine_hi = (best_hz + FINE_SPAN).min(HI);
    let mut hz = fine_lo;
    while hz <= fine_hi {
        let power = power_at(samples, hz, sample_rate_hz);
        if power > best_power {
            best_power = power;
            best_hz = hz;
        }
        hz += FINE_STEP;
    }

    (best_hz, best_power)
}

/// Map a frequency to an 8-bit luminance value: 1500 Hz -> 0, 2300 Hz -> 255,
/// saturating outside that range.
pub fn freq_to_luminance(hz: f64) -> u8 {
    lerp_clamped(hz, 1500.0, 2300.0, 0.0, 255.0).round() as u8
}

/// The inverse of [`freq_to_luminance`]: 0 -> 1500 Hz, 255 -> 2300 Hz.
pub fn luminance_to_freq(luminance: u8) -> f64 {
    lerp_clamped(luminance as f64, 0.0, 255.0, 1500.0, 2300.0)
}
