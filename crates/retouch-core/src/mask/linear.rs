//! Linear (tilt-shift) focus mask
//!
//! The two control points sit on the two edges of a sharp band. The band is
//! perpendicular to the segment joining them. Outside the band the blur
//! amount ramps from 0.0 up to 1.0 over one band-width.

use super::{smootherstep, Mask};

/// Linear focus band in pixel coordinates.
///
/// # Example
/// ```ignore
/// // Horizontal band between y = 40 and y = 60
/// let mask = LinearFocusMask::new((50.0, 40.0), (50.0, 60.0));
/// assert_eq!(mask.evaluate(10.0, 50.0), 0.0);
/// assert_eq!(mask.evaluate(10.0, 100.0), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFocusMask {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl LinearFocusMask {
    pub fn new(start: (f32, f32), end: (f32, f32)) -> Self {
        Self { start, end }
    }

    /// Direction from start to end and its squared length.
    #[inline]
    fn direction_and_len_sq(&self) -> (f32, f32, f32) {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx, dy, dx * dx + dy * dy)
    }

    /// Width of the sharp band in pixels.
    pub fn band_width(&self) -> f32 {
        self.direction_and_len_sq().2.sqrt()
    }
}

impl Mask for LinearFocusMask {
    /// Blur amount: 0 inside the band, rising to 1 one band-width outside.
    ///
    /// Coincident control points describe no band and blur nothing.
    fn evaluate(&self, x: f32, y: f32) -> f32 {
        let (dx, dy, len_sq) = self.direction_and_len_sq();
        if len_sq < f32::EPSILON {
            return 0.0;
        }

        // Position along the normal: 0 at start, 1 at end
        let t = ((x - self.start.0) * dx + (y - self.start.1) * dy) / len_sq;
        let outside = if t < 0.0 {
            -t
        } else if t > 1.0 {
            t - 1.0
        } else {
            0.0
        };
        smootherstep(outside)
    }
}
