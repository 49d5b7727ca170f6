//! VIS (Vertical Interval Signaling) detection and generation (`spec.md` §4.B).

use super::tone::dominant_frequency;

const WINDOW_MS: f64 = 10.0;
const BIT_MS: f64 = 30.0;

const LEADER_LO_HZ: f64 = 1850.0;
const LEADER_HI_HZ: f64 = 1950.0;
const BREAK_LO_HZ: f64 = 1150.0;
const BREAK_HI_HZ: f64 = 1250.0;
const BIT_THRESHOLD_HZ: f64 = 1200.0;

fn window_samples(sample_rate_hz: f64, duration_ms: f64) -> usize {
    ((sample_rate_hz * duration_ms / 1000.0).round() as usize).max(1)
}

fn window_dominant(samples: &[f32], start: usize, len: usize, sample_rate_hz: f64) -> Option<f64> {
    let end = (start + len).min(samples.len());
    if end <= start {
        return None;
    }
    Some(dominant_frequency(&samples[start..end], sample_rate_hz).0)
}

/// Outcome of a successful VIS decode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisDecodeResult {
    pub code: u8,
    /// Index into the input buffer one sample past the last consumed bit.
    pub samples_consumed: usize,
}

/// Scan `samples` for a leader window (dominant in `[1850, 1950]` Hz)
/// immediately followed by a break window (dominant in `[1150, 1250]` Hz),
/// then decode the 8 following 30 ms data bits LSB-first: `1` if the
/// window's dominant frequency is below 1200 Hz, else `0`.
///
/// Returns `None` if no leader/break pair with 8 complete trailing bit
/// windows is found in the buffer.
pub fn try_decode_vis(samples: &[f32], sample_rate_hz: f64) -> Option<VisDecodeResult> {
    let window_len = window_samples(sample_rate_hz, WINDOW_MS);
    let bit_len = window_samples(sample_rate_hz, BIT_MS);

    let mut pos = 0usize;
    while pos + 2 * window_len <= samples.len() {
        let leader = window_dominant(samples, pos, window_len, sample_rate_hz)?;
        if (LEADER_LO_HZ..=LEADER_HI_HZ).contains(&leader) {
            let break_start = pos + window_len;
            let brk = window_dominant(samples, break_start, window_len, sample_rate_hz)?;
            if (BREAK_LO_HZ..=BREAK_HI_HZ).contains(&brk) {
                let bits_start = break_start + window_len;
                if bits_start + 8 * bit_len > samples.len() {
                    return None;
                }

                let mut code = 0u8;
                for bit_idx in 0..8 {
                    let start = bits_start + bit_idx * bit_len;
                    let dominant = window_dominant(samples, start, bit_len, sample_rate_hz)?;
                    let bit = if dominant < BIT_THRESHOLD_HZ { 1 } else { 0 };
                    code |= bit << bit_idx; // LSB-first assembly
                }

                return Some(VisDecodeResult {
                    code,
                    samples_consumed: bits_start + 8 * bit_len,
                });
            }
        }
        pos += window_len;
    }
    None
}

/// A single synthesizer tone: frequency in Hz and duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq_hz: f64,
    pub duration_ms: f64,
}

/// Build the VIS preamble tone sequence for `code` (`spec.md` §4.B
/// "Generation"): leader/break/leader, start bit, 8 data bits LSB-first
/// (1 -> 1100 Hz, 0 -> 1300 Hz), stop bit.
pub fn generate_vis_preamble(code: u8) -> Vec<Tone> {
    let mut tones = vec![
        Tone { freq_hz: 1900.0, duration_ms: 300.0 },
        Tone { freq_hz: 1200.0, duration_ms: 10.0 },
        Tone { freq_hz: 1900.0, duration_ms: 300.0 },
        Tone { freq_hz: 1200.0, duration_ms: 30.0 }, // start bit
    ];

    for bit_idx in 0..8 {
        let bit = (code >> bit_idx) & 1;
        let freq = if bit == 1 { 1100.0 } else { 1300.0 };
        tones.push(Tone { freq_hz: freq, duration_ms: 30.0 });
    }

    tones.push(Tone { freq_hz: 1200.0, duration_ms: 30.0 }); // stop bit
    tones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sstv::synth::ToneSynthesizer;

    fn render(tones: &[Tone], sample_rate_hz: f64) -> Vec<f32> {
        let mut synth = ToneSynthesizer::new(sample_rate_hz);
        synth.render(tones)
    }

    #[test]
    fn generate_then_decode_is_bit_exact_for_every_known_code() {
        let codes: &[u8] = &[0x08, 0x0C, 0x2C, 0x28, 0x3C, 0x38, 0x71, 0x5D, 0x63, 0x5F, 0x61, 0x60, 0x62, 0x64, 0x55];
        let sample_rate = 48_000.0;
        for &code in codes {
            let tones = generate_vis_preamble(code);
            let audio = render(&tones, sample_rate);
            let decoded = try_decode_vis(&audio, sample_rate).expect("decode should succeed");
            assert_eq!(decoded.code, code, "round trip failed for code {code:#04x}");
        }
    }

    #[test]
    fn silence_never_decodes() {
        let silence = vec![0.0f32; 48_000];
        assert!(try_decode_vis(&silence, 48_000.0).is_none());
    }
}
