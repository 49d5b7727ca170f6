//! Audio channel impairment for tests and synthetic fixtures: AWGN noise
//! injection, modeled directly on the amplitude-domain noise injector used
//! for the DSP validation suite this codec's timing constants were checked
//! against.

use rand::Rng;
use rand_distr::StandardNormal;

/// Apply additive white Gaussian noise to mono PCM audio.
///
/// `noise_std` controls the effective SNR: 0.0 leaves the signal untouched,
/// larger values progressively degrade sync and VIS detection. Used only by
/// tests and the CLI's synthetic-impairment demo path; the production
/// receive loop never calls this.
pub fn apply_audio_noise<R: Rng>(audio: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    let mut noisy = audio.to_vec();
    for sample in noisy.iter_mut() {
        let noise: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
        *sample += noise as f32;
    }
    noisy
}
