//! Retouch Core - non-destructive photo editing
//!
//! This crate provides the edit model and rendering pipeline behind an
//! in-app photo editor: an orientation algebra over the eight EXIF
//! orientations, a value-comparable edit model with an observable mutable
//! variant, a catalog of photo effects, and a renderer that composes a fixed
//! sequence of filters over one source image with single-slot caching.

pub mod config;
pub mod decode;
pub mod effects;
pub mod encode;
pub mod enhance;
pub mod filter;
pub mod geometry;
pub mod histogram;
pub mod lens;
pub mod lut;
pub mod mask;
pub mod model;
pub mod orientation;
pub mod render;
pub mod transform;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use image::RgbaImage;

pub use config::RenderConfig;
pub use effects::{EffectCatalog, EffectDescriptor};
pub use geometry::ImageGeometry;
pub use lens::{Lens, LensHandle};
pub use model::{EditModel, FocusType, MutableEditModel, Point, Rect};
pub use orientation::{AffineTransform, Orientation};
pub use render::{DrawTarget, EncodedImage, RenderMode, Renderer};

/// A shared, immutable RGBA bitmap compared by identity.
///
/// Two handles are equal only if they point at the same allocation, which
/// is what the render cache keys on.
#[derive(Clone)]
pub struct ImageHandle(Arc<RgbaImage>);

impl ImageHandle {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn from_arc(image: Arc<RgbaImage>) -> Self {
        Self(image)
    }

    /// Returns true if both handles refer to the same bitmap.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Take the bitmap out of the handle, copying only if it is shared.
    pub fn into_image(self) -> RgbaImage {
        Arc::unwrap_or_clone(self.0)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

impl Deref for ImageHandle {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        &self.0
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl From<RgbaImage> for ImageHandle {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageHandle({}x{} @ {:p})",
            self.0.width(),
            self.0.height(),
            Arc::as_ptr(&self.0)
        )
    }
}

/// Histogram data for an image
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Red channel histogram (256 bins)
    pub red: [u32; 256],
    /// Green channel histogram (256 bins)
    pub green: [u32; 256],
    /// Blue channel histogram (256 bins)
    pub blue: [u32; 256],
    /// Luminance histogram (256 bins)
    pub luminance: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
            luminance: [0; 256],
        }
    }
}

impl Histogram {
    /// Create a new empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples counted in each channel.
    pub fn total(&self) -> u64 {
        self.luminance.iter().map(|&c| c as u64).sum()
    }
}
