//! Per-line color scanning and YCrCb/RGB colorimetry (`spec.md` §4.C).

use super::tone::{dominant_frequency, freq_to_luminance};

/// Split `samples` into `pixel_count` equal windows and resolve each one's
/// dominant frequency to an 8-bit luminance value.
pub fn scan_channel_luminance(samples: &[f32], sample_rate_hz: f64, pixel_count: usize) -> Vec<u8> {
    scan_channel_luminance_compensated(samples, sample_rate_hz, pixel_count, 0.0)
}

/// As [`scan_channel_luminance`], but subtracting `drift_offset_hz` from
/// every Goertzel dominant-frequency reading before converting to
/// luminance, per the sync-tone drift compensation (`spec.md` §4.E).
pub fn scan_channel_luminance_compensated(
    samples: &[f32],
    sample_rate_hz: f64,
    pixel_count: usize,
    drift_offset_hz: f64,
) -> Vec<u8> {
    if pixel_count == 0 || samples.is_empty() {
        return Vec::new();
    }
    let window = samples.len() as f64 / pixel_count as f64;
    (0..pixel_count)
        .map(|i| {
            let start = (i as f64 * window).round() as usize;
            let end = (((i + 1) as f64 * window).round() as usize).min(samples.len());
            if end <= start {
                return 0;
            }
            let (hz, _power) = dominant_frequency(&samples[start..end], sample_rate_hz);
            freq_to_luminance(hz - drift_offset_hz)
        })
        .collect()
}

/// Assemble a GBR triple of per-pixel channel arrays (Martin family order:
/// green, blue, red) into RGB pixels.
pub fn combine_gbr(g: &[u8], b: &[u8], r: &[u8]) -> Vec<[u8; 3]> {
    let n = g.len().min(b.len()).min(r.len());
    (0..n).map(|i| [r[i], g[i], b[i]]).collect()
}

/// Assemble an RGB triple of per-pixel channel arrays (Wraase SC2-180 order)
/// into RGB pixels.
pub fn combine_rgb(r: &[u8], g: &[u8], b: &[u8]) -> Vec<[u8; 3]> {
    let n = r.len().min(g.len()).min(b.len());
    (0..n).map(|i| [r[i], g[i], b[i]]).collect()
}

/// ITU-R BT.601-style RGB -> YCrCb, matching the inverse used by
/// [`ycrcb_to_rgb`].
pub fn rgb_to_ycrcb(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = [rgb[0] as f64, rgb[1] as f64, rgb[2] as f64];
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cr = (r - y) * 0.713 + 128.0;
    let cb = (b - y) * 0.564 + 128.0;
    [clamp_u8(y), clamp_u8(cr), clamp_u8(cb)]
}

/// Inverse of [`rgb_to_ycrcb`].
pub fn ycrcb_to_rgb(ycrcb: [u8; 3]) -> [u8; 3] {
    let y = ycrcb[0] as f64;
    let cr = ycrcb[1] as f64 - 128.0;
    let cb = ycrcb[2] as f64 - 128.0;
    let r = y + 1.402 * cr;
    let g = y - 0.714 * cr - 0.344 * cb;
    let b = y + 1.772 * cb;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Combine a luma row with a chroma pair into RGB pixels (Robot/PD families).
pub fn combine_ycrcb(y: &[u8], cr: &[u8], cb: &[u8]) -> Vec<[u8; 3]> {
    let n = y.len().min(cr.len()).min(cb.len());
    (0..n).map(|i| ycrcb_to_rgb([y[i], cr[i], cb[i]])).collect()
}
