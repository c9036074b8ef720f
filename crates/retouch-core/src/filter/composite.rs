//! Compositing kernels.

use image::{imageops, RgbaImage};

use super::{keys, FilterError, FilterParams};
use crate::mask::{blend_masked, ImageMask};

/// Blend the input over `background` using `mask`'s red channel as the
/// per-pixel amount. The output has the background's size.
pub fn blend_with_mask(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let background = params.image(keys::BACKGROUND)?;
    let mask = params.image(keys::MASK)?;
    Ok(blend_masked(&background, input, &ImageMask(&mask)))
}

/// Source-over alpha compositing of the input onto `background`, anchored
/// at the top-left corner.
pub fn source_over(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let mut output = params.image(keys::BACKGROUND)?.into_image();
    imageops::overlay(&mut output, input, 0, 0);
    Ok(output)
}
