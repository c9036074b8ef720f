//! JPEG encoding for export.
//!
//! Uses the `image` crate's JPEG encoder. JPEG carries no alpha, so the
//! alpha channel is dropped.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Map a quality in `[0, 1]` to the encoder's 1-100 scale.
pub fn quality_from_unit(quality: f32) -> u8 {
    let quality = if quality.is_nan() { 1.0 } else { quality.clamp(0.0, 1.0) };
    ((quality * 100.0).round() as u8).max(1)
}

/// Encode `image` to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let rgb: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
