//! Export encoding.
//!
//! This module provides:
//! - JPEG encoding with configurable quality
//! - EXIF pass-through from the source file, sanitized for the rendered output
//!
//! # Examples
//!
//! ```ignore
//! use retouch_core::encode::{embed_exif, encode_jpeg, SourceMetadata};
//!
//! let jpeg = encode_jpeg(&rendered, 90)?;
//! let metadata = SourceMetadata::from_path(Path::new("original.jpg"))?;
//! let block = metadata.sanitized(model.is_geometry_identity()).to_exif_block()?;
//! let jpeg = embed_exif(&jpeg, &block)?;
//! ```

mod jpeg;
mod metadata;

pub use jpeg::{encode_jpeg, quality_from_unit, EncodeError};
pub use metadata::{embed_exif, MetadataError, SourceMetadata, REGION_OF_INTEREST_TAGS};
