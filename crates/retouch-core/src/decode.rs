//! Source image decoding with EXIF orientation reading.
//!
//! Decoded bitmaps are returned exactly as stored. The EXIF orientation is
//! reported next to the bitmap instead of being baked in, so the host can
//! seed the edit model's `applied_orientation` and keep rotation
//! non-destructive.
//!
//! ```ignore
//! let bytes = std::fs::read("photo.jpg")?;
//! let source = decode_image(&bytes)?;
//! let mut model = EditModel::default();
//! model.applied_orientation = source.orientation;
//! ```

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::ImageReader;
use thiserror::Error;

use crate::orientation::Orientation;
use crate::ImageHandle;

/// Errors that can occur while decoding a source image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// A decoded bitmap and the orientation its metadata asks for.
#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub image: ImageHandle,
    pub orientation: Orientation,
}

/// Decode JPEG or PNG bytes without applying EXIF orientation.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedSource, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let image = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?
        .into_rgba8();

    Ok(DecodedSource {
        image: ImageHandle::new(image),
        orientation: read_orientation(bytes),
    })
}

/// Read and decode the file at `path`.
pub fn decode_file(path: &Path) -> Result<DecodedSource, DecodeError> {
    let bytes = std::fs::read(path).map_err(|e| DecodeError::IoError(e.to_string()))?;
    decode_image(&bytes)
}

/// EXIF orientation stored in `bytes`.
///
/// Returns `Orientation::Normal` when there is no EXIF data or the tag is
/// missing or out of range.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .and_then(Orientation::from_exif)
        .unwrap_or_default()
}
