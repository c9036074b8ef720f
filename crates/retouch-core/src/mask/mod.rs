//! Blend masks for focus (tilt-shift) blur and masked compositing
//!
//! A mask maps a pixel-space coordinate to a blend amount from 0.0 (keep the
//! background) to 1.0 (take the foreground). Coordinates are pixel centres
//! with the origin at the top-left corner.
//!
//! ## Mask Types
//!
//! - **Linear focus**: a sharp band between two parallel lines through the
//!   control points, blurring towards the outside
//! - **Radial focus**: a sharp disc around the first control point, blurring
//!   towards the outside
//! - **Image mask**: per-pixel amounts read from a bitmap's red channel
//!
//! Transitions use the smootherstep function for natural falloff.

pub mod apply;
pub mod linear;
pub mod radial;

pub use apply::{blend_masked, ImageMask};
pub use linear::LinearFocusMask;
pub use radial::RadialFocusMask;

/// A per-pixel blend amount.
pub trait Mask {
    /// Blend amount in `[0, 1]` at pixel-space coordinate `(x, y)`.
    fn evaluate(&self, x: f32, y: f32) -> f32;
}

/// Smootherstep interpolation function.
///
/// Returns values from 0.0 to 1.0 with zero velocity and acceleration at boundaries.
///
/// Formula: `6t^5 - 15t^4 + 10t^3`
#[inline]
pub fn smootherstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smootherstep_boundaries() {
        assert!((smootherstep(0.0) - 0.0).abs() < f32::EPSILON);
        assert!((smootherstep(1.0) - 1.0).abs() < f32::EPSILON);
        assert!((smootherstep(0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_smootherstep_clamping() {
        assert_eq!(smootherstep(-3.0), 0.0);
        assert_eq!(smootherstep(7.0), 1.0);
    }

    #[test]
    fn test_smootherstep_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let val = smootherstep(i as f32 / 100.0);
            assert!(val >= prev);
            prev = val;
        }
    }

    #[test]
    fn test_smootherstep_symmetry() {
        // f(0.5 - x) + f(0.5 + x) = 1.0
        assert!((smootherstep(0.2) + smootherstep(0.8) - 1.0).abs() < 1e-6);
    }
}
