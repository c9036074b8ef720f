//! Image cropping operations.
//!
//! Crop rectangles are in pixel coordinates with the origin at the top-left
//! corner. Rectangles are clamped to the image bounds and never produce an
//! image smaller than 1x1.

use image::{imageops, RgbaImage};

use crate::model::Rect;

/// Integer crop region in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a (rounded) pixel-space rectangle to a `width` by `height` image.
///
/// The result lies inside the image and is at least 1x1.
pub fn clamp_crop_rect(rect: &Rect, width: u32, height: u32) -> PixelRect {
    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;

    let left = rect.x.round().clamp(0.0, max_x) as u32;
    let top = rect.y.round().clamp(0.0, max_y) as u32;
    let right = (rect.x + rect.width).round().clamp(0.0, width as f64) as u32;
    let bottom = (rect.y + rect.height).round().clamp(0.0, height as f64) as u32;

    PixelRect {
        x: left,
        y: top,
        width: right.saturating_sub(left).max(1),
        height: bottom.saturating_sub(top).max(1),
    }
}

/// Crop `image` to `rect` after clamping it to the image bounds.
///
/// ```ignore
/// let cropped = apply_crop(&image, &Rect::new(25.0, 25.0, 50.0, 50.0));
/// assert_eq!(cropped.dimensions(), (50, 50));
/// ```
pub fn apply_crop(image: &RgbaImage, rect: &Rect) -> RgbaImage {
    let region = clamp_crop_rect(rect, image.width(), image.height());
    if region.x == 0 && region.y == 0 && (region.width, region.height) == image.dimensions() {
        return image.clone();
    }
    imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}
