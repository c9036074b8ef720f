//! Drawing rendered output into host surfaces.

use image::{imageops, RgbaImage};

use crate::config::DrawFilter;
use crate::model::Rect;

/// A host surface the renderer can draw into.
pub trait DrawTarget {
    /// Stable identity of the underlying surface. A new id makes the
    /// renderer rebuild its draw context.
    fn target_id(&self) -> u64;

    /// Blit `image` with its top-left corner at `(x, y)`.
    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64);
}

/// Per-target drawing state.
#[derive(Debug)]
pub struct DrawContext {
    target_id: u64,
    filter: imageops::FilterType,
}

impl DrawContext {
    pub fn new(target_id: u64, filter: DrawFilter) -> Self {
        log::debug!("creating draw context for target {target_id}");
        Self {
            target_id,
            filter: filter.to_image_filter(),
        }
    }

    pub fn target_id(&self) -> u64 {
        self.target_id
    }

    /// Scale `image` to fit `viewport` (aspect preserved), centre it and
    /// hand it to `target`.
    pub fn draw(&self, target: &mut dyn DrawTarget, image: &RgbaImage, viewport: &Rect) {
        let Some((width, height)) = fit_size(image.dimensions(), viewport) else {
            return;
        };
        let x = (viewport.x + (viewport.width - width as f64) / 2.0).round() as i64;
        let y = (viewport.y + (viewport.height - height as f64) / 2.0).round() as i64;

        if (width, height) == image.dimensions() {
            target.draw_image(image, x, y);
        } else {
            let scaled = imageops::resize(image, width, height, self.filter);
            target.draw_image(&scaled, x, y);
        }
    }
}

/// Largest size with the aspect ratio of `size` that fits in `viewport`.
fn fit_size(size: (u32, u32), viewport: &Rect) -> Option<(u32, u32)> {
    let (w, h) = (size.0 as f64, size.1 as f64);
    if w == 0.0 || h == 0.0 || viewport.width < 1.0 || viewport.height < 1.0 {
        return None;
    }
    let scale = (viewport.width / w).min(viewport.height / h);
    Some((((w * scale).round() as u32).max(1), ((h * scale).round() as u32).max(1)))
}
