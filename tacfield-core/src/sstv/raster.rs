//! The RGBA image raster (`spec.md` §3 "Image raster").

use ndarray::Array3;

/// A width x height array of RGBA pixels, 8 bits per channel. Decoder
/// output always carries alpha 255.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    /// Shape `(height, width, 4)`, channel order R, G, B, A.
    pixels: Array3<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        let mut pixels = Array3::zeros((height, width, 4));
        pixels.slice_mut(ndarray::s![.., .., 3]).fill(255);
        Self { width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[[y, x, 0]] = rgb[0];
        self.pixels[[y, x, 1]] = rgb[1];
        self.pixels[[y, x, 2]] = rgb[2];
        self.pixels[[y, x, 3]] = 255;
    }

    #[inline]
    pub fn get_rgb(&self, x: usize, y: usize) -> [u8; 3] {
        [self.pixels[[y, x, 0]], self.pixels[[y, x, 1]], self.pixels[[y, x, 2]]]
    }

    /// Raw RGBA bytes, row-major, for persistence (`spec.md` §6 history).
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }

    pub fn from_rgba_bytes(width: usize, height: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width * height * 4 {
            return None;
        }
        let pixels = Array3::from_shape_vec((height, width, 4), bytes.to_vec()).ok()?;
        Some(Self { width, height, pixels })
    }

    /// Mean absolute per-channel error against another raster of the same
    /// dimensions, over R/G/B only (used by the round-trip acceptance
    /// tests in `spec.md` §8).
    pub fn mean_abs_rgb_error(&self, other: &Raster) -> f64 {
        assert_eq!((self.width, self.height), (other.width, other.height));
        let mut total = 0.0_f64;
        let mut count = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                let a = self.get_rgb(x, y);
                let b = other.get_rgb(x, y);
                for c in 0..3 {
                    total += (a[c] as f64 - b[c] as f64).abs();
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    /// Apply a horizontal slant correction: for each row `y`, shift the
    /// source column by `round((1 - slant) * height * y / height)` pixels,
    /// wrapping modulo width (§4.E).
    pub fn reslant(&self, slant: f64) -> Raster {
        let mut out = Raster::new(self.width, self.height);
        for y in 0..self.height {
            let shift = ((1.0 - slant) * self.height as f64 * y as f64 / self.height as f64).round() as i64;
            for x in 0..self.width {
                let src_x = ((x as i64 + shift).rem_euclid(self.width as i64)) as usize;
                out.set_rgb(x, y, self.get_rgb(src_x, y));
            }
        }
        out
    }
}
