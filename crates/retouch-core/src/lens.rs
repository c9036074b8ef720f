//! Pluggable third-party filter ("lens") interface.
//!
//! A lens is an opaque, host-provided filter. The renderer only depends on
//! this trait: it hands the lens a bitmap and accepts a bitmap back, or
//! keeps its own image when the lens declines.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

/// Capability interface for an external style filter.
///
/// Implementations are shared between the edit model and the render worker,
/// so they must be `Send + Sync` and use interior mutability for any state
/// touched by `setup`/`cleanup`.
pub trait Lens: Send + Sync {
    /// Prepare resources before a filter pass.
    fn setup(&self) {}

    /// Release resources after a filter pass.
    fn cleanup(&self) {}

    /// Whether the lens runs in still-image editor mode (as opposed to a
    /// live camera feed).
    fn editor_mode(&self) -> bool {
        true
    }

    /// Ask a live-feed lens to treat the next frame as a capture.
    fn use_next_frame_for_image_capture(&self) {}

    /// Filter `bitmap`, returning `None` to leave it unchanged.
    fn filter(&self, bitmap: &RgbaImage) -> Option<RgbaImage>;
}

/// Shared handle to a [`Lens`], compared by identity.
#[derive(Clone)]
pub struct LensHandle(Arc<dyn Lens>);

impl LensHandle {
    pub fn new(lens: impl Lens + 'static) -> Self {
        Self(Arc::new(lens))
    }

    pub fn from_arc(lens: Arc<dyn Lens>) -> Self {
        Self(lens)
    }

    /// Run one filter pass, bracketed by `setup` and `cleanup`.
    pub fn run(&self, bitmap: &RgbaImage) -> Option<RgbaImage> {
        self.0.setup();
        if !self.0.editor_mode() {
            self.0.use_next_frame_for_image_capture();
        }
        let filtered = self.0.filter(bitmap);
        self.0.cleanup();
        filtered
    }
}

impl std::ops::Deref for LensHandle {
    type Target = dyn Lens;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for LensHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for LensHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LensHandle({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}
