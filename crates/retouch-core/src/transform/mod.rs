//! Geometric operations: arbitrary-angle rotation and cropping.
//!
//! The render pipeline applies these after orientation relabeling, in this
//! order:
//! 1. Straighten rotation onto an expanded canvas
//! 2. Crop
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise on screen
//! - Crop rectangles are in pixels
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::{apply_crop, clamp_crop_rect, PixelRect};
pub use rotation::{apply_rotation, compute_rotated_bounds, rotate_point, InterpolationFilter};
