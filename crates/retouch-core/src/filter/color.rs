//! Per-pixel color kernels.
//!
//! All kernels work on straight (non-premultiplied) RGB in `[0, 1]` and
//! leave alpha untouched. Results are clamped and rounded back to 8 bits.

use image::RgbaImage;

use super::{keys, luminance, map_rgb, FilterError, FilterParams};

/// Saturation, then brightness, then contrast.
///
/// Parameters: `saturation` (1 = unchanged), `brightness` (0 = unchanged,
/// added to each channel), `contrast` (1 = unchanged, scaled around 0.5).
pub fn color_controls(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let saturation = params.number_or(keys::SATURATION, 1.0)?;
    let brightness = params.number_or(keys::BRIGHTNESS, 0.0)?;
    let contrast = params.number_or(keys::CONTRAST, 1.0)?;

    Ok(map_rgb(input, |r, g, b| {
        let (r, g, b) = apply_saturation(r, g, b, saturation);
        let (r, g, b) = (r + brightness, g + brightness, b + brightness);
        apply_contrast(r, g, b, contrast)
    }))
}

/// Exposure in stops: `output = input * 2^ev`.
pub fn exposure_adjust(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let ev = params.number_or(keys::EV, 0.0)?;
    let multiplier = 2.0_f32.powf(ev);
    Ok(map_rgb(input, |r, g, b| (r * multiplier, g * multiplier, b * multiplier)))
}

/// Highlight and shadow recovery.
///
/// `highlights` ranges over `[0, 1]` with 1 as the no-op; lower values pull
/// bright areas down. `shadows` ranges over `[-1, 1]` with 0 as the no-op;
/// positive values lift dark areas, negative values deepen them.
pub fn highlight_shadow_adjust(
    input: &RgbaImage,
    params: &FilterParams,
) -> Result<RgbaImage, FilterError> {
    let highlights = params.number_or(keys::HIGHLIGHTS, 1.0)?;
    let shadows = params.number_or(keys::SHADOWS, 0.0)?;

    Ok(map_rgb(input, |r, g, b| {
        let lum = luminance(r, g, b);
        let (r, g, b) = apply_highlights(r, g, b, lum, highlights);
        apply_shadows(r, g, b, lum, shadows)
    }))
}

/// Classic sepia matrix, blended with the input by `intensity` (default 1).
pub fn sepia_tone(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let intensity = params.number_or(keys::INTENSITY, 1.0)?.clamp(0.0, 1.0);

    Ok(map_rgb(input, |r, g, b| {
        let sr = 0.393 * r + 0.769 * g + 0.189 * b;
        let sg = 0.349 * r + 0.686 * g + 0.168 * b;
        let sb = 0.272 * r + 0.534 * g + 0.131 * b;
        (mix(r, sr, intensity), mix(g, sg, intensity), mix(b, sb, intensity))
    }))
}

/// Tint the luminance with `color`, blended by `intensity` (default 1).
pub fn monochrome(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let color = params.color_or(keys::COLOR, [1.0, 1.0, 1.0, 1.0])?;
    let intensity = params.number_or(keys::INTENSITY, 1.0)?.clamp(0.0, 1.0);

    Ok(map_rgb(input, |r, g, b| {
        let lum = luminance(r, g, b);
        (
            mix(r, lum * color[0], intensity),
            mix(g, lum * color[1], intensity),
            mix(b, lum * color[2], intensity),
        )
    }))
}

/// Per-channel linear stretch from `blackPoint` to `whitePoint`.
pub fn levels(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let black = params.color_or(keys::BLACK_POINT, [0.0; 4])?;
    let white = params.color_or(keys::WHITE_POINT, [1.0; 4])?;

    for channel in 0..3 {
        if white[channel] <= black[channel] {
            return Err(FilterError::invalid(
                keys::WHITE_POINT,
                format!("channel {channel} white point must exceed black point"),
            ));
        }
    }

    let stretch = |v: f32, c: usize| (v - black[c]) / (white[c] - black[c]);
    Ok(map_rgb(input, |r, g, b| (stretch(r, 0), stretch(g, 1), stretch(b, 2))))
}

#[inline]
fn mix(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[inline]
fn apply_saturation(r: f32, g: f32, b: f32, saturation: f32) -> (f32, f32, f32) {
    if saturation == 1.0 {
        return (r, g, b);
    }
    let lum = luminance(r, g, b);
    (
        mix(lum, r, saturation),
        mix(lum, g, saturation),
        mix(lum, b, saturation),
    )
}

#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, contrast: f32) -> (f32, f32, f32) {
    if contrast == 1.0 {
        return (r, g, b);
    }
    let midpoint = 0.5;
    (
        (r - midpoint) * contrast + midpoint,
        (g - midpoint) * contrast + midpoint,
        (b - midpoint) * contrast + midpoint,
    )
}

/// Returns 0 for x <= edge0, 1 for x >= edge1, and interpolates between.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn apply_highlights(r: f32, g: f32, b: f32, lum: f32, highlights: f32) -> (f32, f32, f32) {
    if highlights == 1.0 {
        return (r, g, b);
    }
    let mask = smoothstep(0.5, 1.0, lum);
    let factor = 1.0 - (1.0 - highlights) * mask;
    (r * factor, g * factor, b * factor)
}

#[inline]
fn apply_shadows(r: f32, g: f32, b: f32, lum: f32, shadows: f32) -> (f32, f32, f32) {
    if shadows == 0.0 {
        return (r, g, b);
    }
    // 1 for dark areas, 0 for bright areas
    let mask = smoothstep(0.5, 0.0, lum);
    let adjustment = shadows * mask;

    if shadows < 0.0 {
        let factor = 1.0 + adjustment;
        (r * factor, g * factor, b * factor)
    } else {
        let lift = adjustment * 0.5;
        (r + lift, g + lift, b + lift)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn pixel_strategy() -> impl Strategy<Value = [u8; 4]> {
        prop::array::uniform4(any::<u8>())
    }

    proptest! {
        #[test]
        fn prop_alpha_is_preserved(px in pixel_strategy(), ev in -3.0f32..3.0, sat in 0.0f32..2.0) {
            let input = RgbaImage::from_pixel(1, 1, Rgba(px));
            let exposed = exposure_adjust(&input, &FilterParams::new().with(keys::EV, ev)).unwrap();
            let saturation = FilterParams::new().with(keys::SATURATION, sat);
            let saturated = color_controls(&input, &saturation).unwrap();
            prop_assert_eq!(exposed.get_pixel(0, 0)[3], px[3]);
            prop_assert_eq!(saturated.get_pixel(0, 0)[3], px[3]);
        }

        #[test]
        fn prop_exposure_is_monotonic(px in pixel_strategy(), ev in 0.0f32..3.0) {
            let input = RgbaImage::from_pixel(1, 1, Rgba(px));
            let out = exposure_adjust(&input, &FilterParams::new().with(keys::EV, ev)).unwrap();
            for c in 0..3 {
                prop_assert!(out.get_pixel(0, 0)[c] >= px[c]);
            }
        }
    }
}
