//! The non-destructive edit model.
//!
//! [`EditModel`] is the complete, value-comparable description of every edit
//! applied to one source image. It is the only input the renderer reads
//! besides the source bitmap. [`MutableEditModel`] wraps the same fields for
//! UI-facing code and coalesces writes into change notifications.

mod mutable;

pub use mutable::{MutableEditModel, SubscriptionId};

use serde::{Deserialize, Serialize};

use crate::lens::LensHandle;
use crate::orientation::Orientation;
use crate::ImageHandle;

/// A point in normalized (0.0 to 1.0) coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// The full-frame normalized rectangle.
    pub const IDENTITY: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Scale a normalized rectangle to a pixel extent.
    pub fn denormalized(&self, width: f64, height: f64) -> Rect {
        Rect {
            x: self.x * width,
            y: self.y * height,
            width: self.width * width,
            height: self.height * height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Round every component to the nearest integer.
    pub fn rounded(&self) -> Rect {
        Rect {
            x: self.x.round(),
            y: self.y.round(),
            width: self.width.round(),
            height: self.height.round(),
        }
    }
}

/// The kind of focus (tilt-shift) blur to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusType {
    /// Focus is disabled.
    #[default]
    Off,
    /// A sharp band between the two control points.
    Linear,
    /// A sharp disc around the first control point.
    Radial,
}

/// Everything that should be applied to an image.
///
/// Color parameters default to the value at which their filter is a no-op:
/// `contrast`, `saturation` and `highlights` are multiplicative (default 1),
/// the rest are additive (default 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditModel {
    /// The orientation of the image.
    pub applied_orientation: Orientation,
    /// The crop rectangle in normalized coordinates of the oriented image.
    pub normalized_crop_rect: Rect,
    /// The straighten angle in radians.
    pub straighten_angle: f64,
    pub auto_enhancement_enabled: bool,
    /// Additive brightness (-1 to 1).
    pub brightness: f32,
    /// Contrast multiplier (0 to 4).
    pub contrast: f32,
    /// Saturation multiplier (0 to 2).
    pub saturation: f32,
    /// Shadow lift (-1 to 1).
    pub shadows: f32,
    /// Highlight amount (0 to 1, lower values recover highlights).
    pub highlights: f32,
    /// Exposure in stops.
    pub exposure: f32,
    /// Clarity blend amount (0 to 1).
    pub clarity: f32,
    /// Identifier of the catalog effect to apply.
    pub effect_filter_identifier: String,
    pub effect_filter_intensity: f32,
    pub focus_type: FocusType,
    pub focus_normalized_control_point1: Point,
    pub focus_normalized_control_point2: Point,
    /// The blur radius to use for focus, in pixels.
    pub focus_blur_radius: f32,
    /// Image composited on top after all other effects.
    #[serde(skip)]
    pub overlay_image: Option<ImageHandle>,
    #[serde(skip)]
    pub lens: Option<LensHandle>,
}

impl Default for EditModel {
    fn default() -> Self {
        Self {
            applied_orientation: Self::IDENTITY_ORIENTATION,
            normalized_crop_rect: Self::IDENTITY_CROP_RECT,
            straighten_angle: 0.0,
            auto_enhancement_enabled: false,
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            shadows: 0.0,
            highlights: 1.0,
            exposure: 0.0,
            clarity: 0.0,
            effect_filter_identifier: crate::effects::IDENTITY_EFFECT.to_string(),
            effect_filter_intensity: 0.75,
            focus_type: FocusType::Off,
            focus_normalized_control_point1: Point::new(0.5, 0.4),
            focus_normalized_control_point2: Point::new(0.5, 0.6),
            focus_blur_radius: 10.0,
            overlay_image: None,
            lens: None,
        }
    }
}

impl EditModel {
    /// The identity orientation of an edit model.
    pub const IDENTITY_ORIENTATION: Orientation = Orientation::Normal;

    /// The identity crop rectangle of an edit model.
    pub const IDENTITY_CROP_RECT: Rect = Rect::IDENTITY;

    pub fn new() -> Self {
        Self::default()
    }

    /// True if the image has neither been reoriented, straightened nor cropped.
    ///
    /// Only then does metadata that refers to source pixel coordinates
    /// remain valid for the rendered output.
    pub fn is_geometry_identity(&self) -> bool {
        self.applied_orientation == Self::IDENTITY_ORIENTATION
            && self.straighten_angle == 0.0
            && self.normalized_crop_rect == Self::IDENTITY_CROP_RECT
    }

    /// True if contrast, brightness and saturation are all at their no-op values.
    pub fn has_identity_color_controls(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 1.0 && self.saturation == 1.0
    }

    /// True if shadows and highlights are at their no-op values.
    pub fn has_identity_highlight_shadow(&self) -> bool {
        self.shadows == 0.0 && self.highlights == 1.0
    }

    /// True if every color adjustment pass would be a no-op.
    pub fn has_identity_color_adjustments(&self) -> bool {
        self.clarity == 0.0
            && self.exposure == 0.0
            && self.has_identity_color_controls()
            && self.has_identity_highlight_shadow()
    }

    /// Serialize the model (without overlay and lens) to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Parse a model from TOML. Missing fields take their defaults.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::Lens;
    use image::RgbaImage;

    struct PassThrough;

    impl Lens for PassThrough {
        fn filter(&self, _bitmap: &RgbaImage) -> Option<RgbaImage> {
            None
        }
    }

    /// One variant per field, each differing from the default in only that field.
    fn single_field_variants() -> Vec<(&'static str, EditModel)> {
        let base = EditModel::default;
        vec![
            (
                "applied_orientation",
                EditModel { applied_orientation: Orientation::FlipX, ..base() },
            ),
            (
                "normalized_crop_rect",
                EditModel { normalized_crop_rect: Rect::new(0.1, 0.0, 0.9, 1.0), ..base() },
            ),
            ("straighten_angle", EditModel { straighten_angle: 0.1, ..base() }),
            ("auto_enhancement_enabled", EditModel { auto_enhancement_enabled: true, ..base() }),
            ("brightness", EditModel { brightness: 0.2, ..base() }),
            ("contrast", EditModel { contrast: 1.2, ..base() }),
            ("saturation", EditModel { saturation: 0.5, ..base() }),
            ("shadows", EditModel { shadows: 0.3, ..base() }),
            ("highlights", EditModel { highlights: 0.5, ..base() }),
            ("exposure", EditModel { exposure: 1.0, ..base() }),
            ("clarity", EditModel { clarity: 0.4, ..base() }),
            (
                "effect_filter_identifier",
                EditModel { effect_filter_identifier: "Sepia".into(), ..base() },
            ),
            ("effect_filter_intensity", EditModel { effect_filter_intensity: 0.5, ..base() }),
            ("focus_type", EditModel { focus_type: FocusType::Radial, ..base() }),
            (
                "focus_normalized_control_point1",
                EditModel { focus_normalized_control_point1: Point::new(0.1, 0.1), ..base() },
            ),
            (
                "focus_normalized_control_point2",
                EditModel { focus_normalized_control_point2: Point::new(0.9, 0.9), ..base() },
            ),
            ("focus_blur_radius", EditModel { focus_blur_radius: 4.0, ..base() }),
            (
                "overlay_image",
                EditModel { overlay_image: Some(ImageHandle::new(RgbaImage::new(1, 1))), ..base() },
            ),
            ("lens", EditModel { lens: Some(LensHandle::new(PassThrough)), ..base() }),
        ]
    }

    #[test]
    fn test_default_is_geometry_identity() {
        assert!(EditModel::default().is_geometry_identity());
        assert!(EditModel::default().has_identity_color_adjustments());
    }

    #[test]
    fn test_geometry_identity_breaks() {
        for o in [
            Orientation::FlipX,
            Orientation::Rotate90,
            Orientation::Transverse,
        ] {
            let model = EditModel {
                applied_orientation: o,
                ..Default::default()
            };
            assert!(!model.is_geometry_identity(), "{o:?}");
        }

        let mut model = EditModel::default();
        model.normalized_crop_rect = Rect::new(0.25, 0.25, 0.5, 0.5);
        assert!(!model.is_geometry_identity());

        let mut model = EditModel::default();
        model.straighten_angle = 0.01;
        assert!(!model.is_geometry_identity());
    }

    #[test]
    fn test_color_edits_keep_geometry_identity() {
        let mut model = EditModel::default();
        model.brightness = 0.5;
        model.clarity = 1.0;
        model.effect_filter_identifier = "Sepia".into();
        assert!(model.is_geometry_identity());
        assert!(!model.has_identity_color_adjustments());
    }

    #[test]
    fn test_equality_reflexive_and_symmetric() {
        let a = EditModel::default();
        let b = EditModel::default();
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn test_equality_detects_each_field() {
        let base = EditModel::default();
        for (field, variant) in single_field_variants() {
            assert_ne!(base, variant, "change to {field} not detected");
            assert_ne!(variant, base, "change to {field} not symmetric");
            assert_eq!(variant, variant.clone(), "{field} clone differs");
        }
    }

    #[test]
    fn test_overlay_compared_by_identity() {
        let pixels = RgbaImage::new(2, 2);
        let a = EditModel {
            overlay_image: Some(ImageHandle::new(pixels.clone())),
            ..Default::default()
        };
        let b = EditModel {
            overlay_image: Some(ImageHandle::new(pixels)),
            ..Default::default()
        };
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_rect_helpers() {
        let rect = Rect::new(0.25, 0.25, 0.5, 0.5).denormalized(100.0, 200.0);
        assert_eq!(rect, Rect::new(25.0, 50.0, 50.0, 100.0));
        assert_eq!(rect.center(), Point::new(50.0, 100.0));
        assert_eq!(Rect::new(0.4, 1.6, 2.5, 3.49).rounded(), Rect::new(0.0, 2.0, 3.0, 3.0));
    }

    #[test]
    fn test_toml_round_trip_skips_handles() {
        let model = EditModel {
            applied_orientation: Orientation::Rotate270,
            normalized_crop_rect: Rect::new(0.1, 0.2, 0.3, 0.4),
            exposure: 0.5,
            focus_type: FocusType::Linear,
            overlay_image: Some(ImageHandle::new(RgbaImage::new(1, 1))),
            ..Default::default()
        };
        let text = model.to_toml().unwrap();
        let parsed = EditModel::from_toml(&text).unwrap();
        assert_eq!(parsed.applied_orientation, Orientation::Rotate270);
        assert_eq!(parsed.normalized_crop_rect, model.normalized_crop_rect);
        assert_eq!(parsed.focus_type, FocusType::Linear);
        assert!(parsed.overlay_image.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = EditModel::from_toml("exposure = 1.5\n").unwrap();
        assert_eq!(parsed.exposure, 1.5);
        assert_eq!(parsed.contrast, 1.0);
        assert_eq!(parsed.effect_filter_identifier, "None");
    }
}
