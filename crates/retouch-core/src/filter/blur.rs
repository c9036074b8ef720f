//! Gaussian-based kernels: sharpening and focus blur.
//!
//! `radius` is the blur radius in pixels; the Gaussian sigma is half of it.

use image::{imageops, RgbaImage};

use super::{keys, to_u8, to_unit, FilterError, FilterParams};
use crate::mask::{blend_masked, LinearFocusMask, Mask, RadialFocusMask};

fn gaussian(input: &RgbaImage, radius: f32) -> RgbaImage {
    imageops::blur(input, radius / 2.0)
}

fn radius(params: &FilterParams, default: f32) -> Result<f32, FilterError> {
    let radius = params.number_or(keys::RADIUS, default)?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(FilterError::invalid(keys::RADIUS, format!("{radius} is not a valid radius")));
    }
    Ok(radius)
}

fn point(params: &FilterParams, key: &str) -> Result<(f32, f32), FilterError> {
    let p = params.point(key)?;
    Ok((p.x as f32, p.y as f32))
}

/// `output = input + (input - blurred) * intensity`.
///
/// Parameters: `radius` (default 2.5), `intensity` (default 0.5).
pub fn unsharp_mask(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let radius = radius(params, 2.5)?;
    let intensity = params.number_or(keys::INTENSITY, 0.5)?;
    if radius == 0.0 || intensity == 0.0 {
        return Ok(input.clone());
    }

    let blurred = gaussian(input, radius);
    let mut output = input.clone();
    for (pixel, soft) in output.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let v = to_unit(pixel[c]);
            pixel[c] = to_u8(v + (v - to_unit(soft[c])) * intensity);
        }
    }
    Ok(output)
}

fn focus(
    input: &RgbaImage,
    params: &FilterParams,
    mask: &impl Mask,
) -> Result<RgbaImage, FilterError> {
    let radius = radius(params, 10.0)?;
    if radius == 0.0 {
        return Ok(input.clone());
    }
    let blurred = gaussian(input, radius);
    Ok(blend_masked(input, &blurred, mask))
}

/// Tilt-shift blur outside the band between `point0` and `point1`.
pub fn linear_focus(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let mask = LinearFocusMask::new(point(params, keys::POINT0)?, point(params, keys::POINT1)?);
    focus(input, params, &mask)
}

/// Blur outside the disc centred on `point0` passing through `point1`.
pub fn radial_focus(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let mask = RadialFocusMask::through(point(params, keys::POINT0)?, point(params, keys::POINT1)?);
    focus(input, params, &mask)
}
