//! Histogram computation from RGBA bitmaps.
//!
//! Used by auto-enhancement to derive levels and exposure corrections.
//! Fully transparent pixels carry no color and are skipped.

use image::RgbaImage;

use crate::Histogram;

/// Compute RGB and luminance histograms of `image`.
///
/// # Performance
/// Single pass, O(n) in the number of pixels; the bins use 4KB.
pub fn compute_histogram(image: &RgbaImage) -> Histogram {
    let mut hist = Histogram::new();

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        hist.red[r as usize] += 1;
        hist.green[g as usize] += 1;
        hist.blue[b as usize] += 1;
        hist.luminance[calculate_luminance_u8(r, g, b) as usize] += 1;
    }

    hist
}

impl Histogram {
    /// Smallest bin value below which at most `fraction` of `bins` lies.
    pub fn percentile(bins: &[u32; 256], fraction: f64) -> u8 {
        let total: u64 = bins.iter().map(|&c| c as u64).sum();
        if total == 0 {
            return 0;
        }
        let target = (total as f64 * fraction.clamp(0.0, 1.0)).ceil().max(1.0) as u64;
        let mut seen = 0u64;
        for (value, &count) in bins.iter().enumerate() {
            seen += count as u64;
            if seen >= target {
                return value as u8;
            }
        }
        255
    }

    /// Mean of the luminance distribution in `[0, 255]`.
    pub fn mean_luminance(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .luminance
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * count as u64)
            .sum();
        weighted as f64 / total as f64
    }
}

/// Luminance from RGB using ITU-R BT.709 coefficients, in 0-255.
#[inline]
fn calculate_luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    let lum = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;
    lum.clamp(0.0, 255.0).round() as u8
}
