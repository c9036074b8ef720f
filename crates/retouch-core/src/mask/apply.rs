//! Masked blending
//!
//! Blends a foreground over a background using a [`Mask`] evaluated at each
//! pixel centre: `output = background * (1 - m) + foreground * m`.

use image::RgbaImage;

use super::Mask;

/// Per-pixel amounts from a bitmap's red channel.
///
/// Coordinates outside the bitmap evaluate to 0.
#[derive(Debug, Clone, Copy)]
pub struct ImageMask<'a>(pub &'a RgbaImage);

impl Mask for ImageMask<'_> {
    fn evaluate(&self, x: f32, y: f32) -> f32 {
        if x < 0.0 || y < 0.0 {
            return 0.0;
        }
        let (px, py) = (x as u32, y as u32);
        if px >= self.0.width() || py >= self.0.height() {
            return 0.0;
        }
        self.0.get_pixel(px, py)[0] as f32 / 255.0
    }
}

/// Blend `foreground` over `background` by `mask`.
///
/// The output has the background's size. Where the foreground does not
/// cover a pixel the background is kept.
pub fn blend_masked(background: &RgbaImage, foreground: &RgbaImage, mask: &impl Mask) -> RgbaImage {
    let mut output = background.clone();
    let (fw, fh) = foreground.dimensions();

    for (px, py, pixel) in output.enumerate_pixels_mut() {
        if px >= fw || py >= fh {
            continue;
        }
        let amount = mask.evaluate(px as f32 + 0.5, py as f32 + 0.5).clamp(0.0, 1.0);
        if amount < 0.001 {
            continue;
        }
        let top = foreground.get_pixel(px, py);
        for c in 0..4 {
            let blended = pixel[c] as f32 * (1.0 - amount) + top[c] as f32 * amount;
            pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    output
}
