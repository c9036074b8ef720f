//! Orientation bookkeeping for live rotate/flip manipulation.
//!
//! [`ImageGeometry`] tracks an input rectangle and the orientation applied to
//! it so far. It is used outside the render pipeline, e.g. to animate a
//! preview from one orientation to the next.

use crate::orientation::{AffineTransform, Orientation};

/// An input rectangle (origin at zero) plus its current orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    input_width: f64,
    input_height: f64,
    applied_orientation: Orientation,
}

impl ImageGeometry {
    /// Create a geometry for an input of the given size in `Normal` orientation.
    pub fn new(input_width: f64, input_height: f64) -> Self {
        Self {
            input_width,
            input_height,
            applied_orientation: Orientation::Normal,
        }
    }

    /// Create a geometry that already has `orientation` applied.
    pub fn with_orientation(input_width: f64, input_height: f64, orientation: Orientation) -> Self {
        Self {
            applied_orientation: orientation,
            ..Self::new(input_width, input_height)
        }
    }

    pub fn input_size(&self) -> (f64, f64) {
        (self.input_width, self.input_height)
    }

    pub fn applied_orientation(&self) -> Orientation {
        self.applied_orientation
    }

    /// Size of the input once the current orientation is applied.
    pub fn output_size(&self) -> (f64, f64) {
        if self.applied_orientation.swaps_dimensions() {
            (self.input_height, self.input_width)
        } else {
            (self.input_width, self.input_height)
        }
    }

    /// Compose `delta` onto the current orientation.
    pub fn apply_orientation(&mut self, delta: Orientation) {
        self.applied_orientation = self.applied_orientation.compose(delta);
    }

    pub fn flip_horizontally(&mut self) {
        self.apply_orientation(Orientation::FlipX);
    }

    pub fn flip_vertically(&mut self) {
        self.apply_orientation(Orientation::FlipY);
    }

    pub fn rotate_clockwise(&mut self) {
        self.apply_orientation(Orientation::Rotate90);
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.apply_orientation(Orientation::Rotate270);
    }

    /// The transform that takes `other`'s frame to this geometry's frame.
    pub fn transform_from(&self, other: &ImageGeometry) -> AffineTransform {
        other
            .applied_orientation
            .between(self.applied_orientation)
            .inverse()
            .affine_transform(self.input_width, self.input_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::ALL_ORIENTATIONS;

    #[test]
    fn test_new_geometry_is_normal() {
        let geometry = ImageGeometry::new(100.0, 50.0);
        assert_eq!(geometry.applied_orientation(), Orientation::Normal);
        assert_eq!(geometry.output_size(), (100.0, 50.0));
    }

    #[test]
    fn test_rotate_clockwise_swaps_output() {
        let mut geometry = ImageGeometry::new(100.0, 50.0);
        geometry.rotate_clockwise();
        assert_eq!(geometry.applied_orientation(), Orientation::Rotate90);
        assert_eq!(geometry.output_size(), (50.0, 100.0));
        assert_eq!(geometry.input_size(), (100.0, 50.0));
    }

    #[test]
    fn test_four_rotations_return_to_normal() {
        let mut geometry = ImageGeometry::new(10.0, 20.0);
        for _ in 0..4 {
            geometry.rotate_clockwise();
        }
        assert_eq!(geometry.applied_orientation(), Orientation::Normal);
    }

    #[test]
    fn test_rotate_then_counter_rotate() {
        let mut geometry = ImageGeometry::new(10.0, 20.0);
        geometry.rotate_clockwise();
        geometry.rotate_counter_clockwise();
        assert_eq!(geometry.applied_orientation(), Orientation::Normal);
    }

    #[test]
    fn test_double_flip_is_identity() {
        let mut geometry = ImageGeometry::new(10.0, 20.0);
        geometry.flip_horizontally();
        assert_eq!(geometry.applied_orientation(), Orientation::FlipX);
        geometry.flip_horizontally();
        assert_eq!(geometry.applied_orientation(), Orientation::Normal);

        geometry.flip_vertically();
        geometry.flip_horizontally();
        assert_eq!(geometry.applied_orientation(), Orientation::Rotate180);
    }

    #[test]
    fn test_transform_from_same_orientation_is_identity() {
        for &o in &ALL_ORIENTATIONS {
            let geometry = ImageGeometry::with_orientation(40.0, 30.0, o);
            assert!(geometry.transform_from(&geometry).is_identity(), "{o:?}");
        }
    }

    #[test]
    fn test_transform_from_normal() {
        let before = ImageGeometry::new(40.0, 30.0);
        let mut after = before;
        after.rotate_clockwise();

        // between(Normal, Rotate90) = Rotate90, inverted = Rotate270.
        let expected = Orientation::Rotate270.affine_transform(40.0, 30.0);
        assert_eq!(after.transform_from(&before), expected);
    }

    #[test]
    fn test_transform_from_transposed() {
        let before = ImageGeometry::with_orientation(40.0, 30.0, Orientation::Transpose);
        let after = ImageGeometry::with_orientation(40.0, 30.0, Orientation::FlipX);

        // between(Transpose, FlipX) = Rotate270, inverted = Rotate90.
        let expected = AffineTransform {
            a: 0.0,
            b: -1.0,
            c: 1.0,
            d: 0.0,
            tx: 0.0,
            ty: 40.0,
        };
        assert_eq!(after.transform_from(&before), expected);

        // The reverse direction is the other quarter turn.
        assert_eq!(
            before.transform_from(&after),
            Orientation::Rotate270.affine_transform(40.0, 30.0)
        );
    }

    #[test]
    fn test_copies_are_independent() {
        let original = ImageGeometry::new(10.0, 10.0);
        let mut copy = original;
        copy.flip_vertically();
        assert_eq!(original.applied_orientation(), Orientation::Normal);
        assert_eq!(copy.applied_orientation(), Orientation::FlipY);
    }
}
