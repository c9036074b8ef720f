//! Radial focus mask
//!
//! The first control point is the centre of a sharp disc; the distance to
//! the second control point is its radius. Beyond the disc the blur amount
//! ramps to 1.0 over one more radius.

use super::{smootherstep, Mask};

/// Radial focus disc in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialFocusMask {
    pub center: (f32, f32),
    pub radius: f32,
}

impl RadialFocusMask {
    pub fn new(center: (f32, f32), radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Disc centred on `center` whose edge passes through `edge`.
    pub fn through(center: (f32, f32), edge: (f32, f32)) -> Self {
        let dx = edge.0 - center.0;
        let dy = edge.1 - center.1;
        Self::new(center, (dx * dx + dy * dy).sqrt())
    }
}

impl Mask for RadialFocusMask {
    fn evaluate(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= self.radius {
            return 0.0;
        }
        // A zero radius leaves only the centre sharp
        let ramp = self.radius.max(1.0);
        smootherstep((distance - self.radius) / ramp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_through_computes_radius() {
        let mask = RadialFocusMask::through((50.0, 40.0), (50.0, 60.0));
        assert_eq!(mask.radius, 20.0);
    }

    #[test]
    fn test_center_and_disc_are_sharp() {
        let mask = RadialFocusMask::new((10.0, 10.0), 5.0);
        assert_eq!(mask.evaluate(10.0, 10.0), 0.0);
        assert_eq!(mask.evaluate(14.0, 10.0), 0.0);
        assert_eq!(mask.evaluate(10.0, 15.0), 0.0);
    }

    #[test]
    fn test_far_is_fully_blurred() {
        let mask = RadialFocusMask::new((10.0, 10.0), 5.0);
        assert_eq!(mask.evaluate(10.0, 20.0), 1.0);
        assert_eq!(mask.evaluate(100.0, 100.0), 1.0);
    }

    #[test]
    fn test_ramp_midpoint() {
        let mask = RadialFocusMask::new((0.0, 0.0), 10.0);
        assert!((mask.evaluate(15.0, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_negative_radius_clamped() {
        let mask = RadialFocusMask::new((0.0, 0.0), -4.0);
        assert_eq!(mask.radius, 0.0);
        assert_eq!(mask.evaluate(0.0, 0.0), 0.0);
        assert_eq!(mask.evaluate(3.0, 0.0), 1.0);
    }
}
