//! Named image filters operating on RGBA bitmaps.
//!
//! Every filter is addressed by name through a [`FilterRegistry`] and
//! configured with a [`FilterParams`] map, so the renderer never depends on
//! a concrete kernel. [`FilterRegistry::builtin`] registers the kernels in
//! this module under the names in [`names`].
//!
//! ## Kernels
//!
//! - Color: `ColorControls`, `ExposureAdjust`, `HighlightShadowAdjust`,
//!   `SepiaTone`, `Monochrome`, `Levels`
//! - Lookup: `ColorCube` (3D color cube with trilinear interpolation)
//! - Blur: `UnsharpMask`, `LinearFocus`, `RadialFocus`
//! - Compositing: `BlendWithMask`, `SourceOverCompositing`

pub mod blur;
pub mod color;
pub mod composite;
pub mod cube;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

use crate::model::Point;
use crate::ImageHandle;

pub use cube::ColorCube;

/// Registered filter names.
pub mod names {
    pub const COLOR_CONTROLS: &str = "ColorControls";
    pub const EXPOSURE_ADJUST: &str = "ExposureAdjust";
    pub const HIGHLIGHT_SHADOW_ADJUST: &str = "HighlightShadowAdjust";
    pub const SEPIA_TONE: &str = "SepiaTone";
    pub const MONOCHROME: &str = "Monochrome";
    pub const LEVELS: &str = "Levels";
    pub const COLOR_CUBE: &str = "ColorCube";
    pub const UNSHARP_MASK: &str = "UnsharpMask";
    pub const LINEAR_FOCUS: &str = "LinearFocus";
    pub const RADIAL_FOCUS: &str = "RadialFocus";
    pub const BLEND_WITH_MASK: &str = "BlendWithMask";
    pub const SOURCE_OVER_COMPOSITING: &str = "SourceOverCompositing";
}

/// Parameter keys understood by the built-in filters.
pub mod keys {
    pub const BRIGHTNESS: &str = "brightness";
    pub const CONTRAST: &str = "contrast";
    pub const SATURATION: &str = "saturation";
    pub const EV: &str = "ev";
    pub const HIGHLIGHTS: &str = "highlights";
    pub const SHADOWS: &str = "shadows";
    pub const INTENSITY: &str = "intensity";
    pub const COLOR: &str = "color";
    pub const BLACK_POINT: &str = "blackPoint";
    pub const WHITE_POINT: &str = "whitePoint";
    pub const CUBE_DIMENSION: &str = "cubeDimension";
    pub const CUBE_DATA: &str = "cubeData";
    pub const COLOR_SPACE: &str = "colorSpace";
    pub const RADIUS: &str = "radius";
    pub const POINT0: &str = "point0";
    pub const POINT1: &str = "point1";
    pub const BACKGROUND: &str = "background";
    pub const MASK: &str = "mask";
}

/// Errors raised while running a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Filter failed: {0}")]
    Failed(String),
}

impl FilterError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single filter parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f32),
    Point(Point),
    /// Straight RGBA in `[0, 1]`.
    Color([f32; 4]),
    Cube(Arc<ColorCube>),
    Image(ImageHandle),
    Text(String),
}

impl FilterValue {
    fn kind(&self) -> &'static str {
        match self {
            FilterValue::Number(_) => "number",
            FilterValue::Point(_) => "point",
            FilterValue::Color(_) => "color",
            FilterValue::Cube(_) => "cube",
            FilterValue::Image(_) => "image",
            FilterValue::Text(_) => "text",
        }
    }
}

impl From<f32> for FilterValue {
    fn from(value: f32) -> Self {
        FilterValue::Number(value)
    }
}

impl From<Point> for FilterValue {
    fn from(value: Point) -> Self {
        FilterValue::Point(value)
    }
}

impl From<[f32; 4]> for FilterValue {
    fn from(value: [f32; 4]) -> Self {
        FilterValue::Color(value)
    }
}

impl From<ColorCube> for FilterValue {
    fn from(value: ColorCube) -> Self {
        FilterValue::Cube(Arc::new(value))
    }
}

impl From<Arc<ColorCube>> for FilterValue {
    fn from(value: Arc<ColorCube>) -> Self {
        FilterValue::Cube(value)
    }
}

impl From<ImageHandle> for FilterValue {
    fn from(value: ImageHandle) -> Self {
        FilterValue::Image(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

/// Ordered map of named filter parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams(BTreeMap<String, FilterValue>);

macro_rules! typed_getter {
    ($name:ident, $variant:ident, $ty:ty) => {
        /// Fetch a required parameter of this kind.
        pub fn $name(&self, key: &str) -> Result<$ty, FilterError> {
            match self.0.get(key) {
                Some(FilterValue::$variant(value)) => Ok(value.clone()),
                Some(other) => Err(FilterError::invalid(
                    key,
                    format!("expected {}, found {}", stringify!($variant), other.kind()),
                )),
                None => Err(FilterError::MissingParameter(key.to_string())),
            }
        }
    };
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FilterValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every entry of `other` over this map.
    pub fn merge(&mut self, other: &FilterParams) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    typed_getter!(number, Number, f32);
    typed_getter!(point, Point, Point);
    typed_getter!(color, Color, [f32; 4]);
    typed_getter!(cube, Cube, Arc<ColorCube>);
    typed_getter!(image, Image, ImageHandle);
    typed_getter!(text, Text, String);

    /// A numeric parameter, or `default` when absent.
    pub fn number_or(&self, key: &str, default: f32) -> Result<f32, FilterError> {
        match self.0.get(key) {
            None => Ok(default),
            Some(_) => self.number(key),
        }
    }

    /// A color parameter, or `default` when absent.
    pub fn color_or(&self, key: &str, default: [f32; 4]) -> Result<[f32; 4], FilterError> {
        match self.0.get(key) {
            None => Ok(default),
            Some(_) => self.color(key),
        }
    }
}

/// An image filter kernel.
pub trait Filter: Send + Sync {
    fn apply(&self, input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&RgbaImage, &FilterParams) -> Result<RgbaImage, FilterError> + Send + Sync,
{
    fn apply(&self, input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
        self(input, params)
    }
}

/// Name-keyed collection of filters.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kernel.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(names::COLOR_CONTROLS, color::color_controls);
        registry.register(names::EXPOSURE_ADJUST, color::exposure_adjust);
        registry.register(names::HIGHLIGHT_SHADOW_ADJUST, color::highlight_shadow_adjust);
        registry.register(names::SEPIA_TONE, color::sepia_tone);
        registry.register(names::MONOCHROME, color::monochrome);
        registry.register(names::LEVELS, color::levels);
        registry.register(names::COLOR_CUBE, cube::color_cube);
        registry.register(names::UNSHARP_MASK, blur::unsharp_mask);
        registry.register(names::LINEAR_FOCUS, blur::linear_focus);
        registry.register(names::RADIAL_FOCUS, blur::radial_focus);
        registry.register(names::BLEND_WITH_MASK, composite::blend_with_mask);
        registry.register(names::SOURCE_OVER_COMPOSITING, composite::source_over);
        registry
    }

    /// Register `filter` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, filter: impl Filter + 'static) {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Run the filter registered under `name`.
    pub fn apply(
        &self,
        name: &str,
        input: &RgbaImage,
        params: &FilterParams,
    ) -> Result<RgbaImage, FilterError> {
        let filter = self
            .get(name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;
        filter.apply(input, params)
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.filters.keys().collect();
        names.sort();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

/// A solid-color image of the given size.
pub fn constant_color(color: [f32; 4], width: u32, height: u32) -> RgbaImage {
    let pixel = image::Rgba(color.map(to_u8));
    RgbaImage::from_pixel(width, height, pixel)
}

/// Luminance using ITU-R BT.709 coefficients.
#[inline]
pub(crate) fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

#[inline]
pub(crate) fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Map every pixel's RGB through `f`, keeping alpha.
pub(crate) fn map_rgb(
    input: &RgbaImage,
    f: impl Fn(f32, f32, f32) -> (f32, f32, f32),
) -> RgbaImage {
    let mut output = input.clone();
    for pixel in output.pixels_mut() {
        let (r, g, b) = f(to_unit(pixel[0]), to_unit(pixel[1]), to_unit(pixel[2]));
        pixel[0] = to_u8(r);
        pixel[1] = to_u8(g);
        pixel[2] = to_u8(b);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gray(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_builtin_registers_all_names() {
        let registry = FilterRegistry::builtin();
        for name in [
            names::COLOR_CONTROLS,
            names::EXPOSURE_ADJUST,
            names::HIGHLIGHT_SHADOW_ADJUST,
            names::SEPIA_TONE,
            names::MONOCHROME,
            names::LEVELS,
            names::COLOR_CUBE,
            names::UNSHARP_MASK,
            names::LINEAR_FOCUS,
            names::RADIAL_FOCUS,
            names::BLEND_WITH_MASK,
            names::SOURCE_OVER_COMPOSITING,
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_unknown_filter() {
        let registry = FilterRegistry::new();
        let result = registry.apply("Nope", &gray(10), &FilterParams::new());
        assert!(matches!(result, Err(FilterError::UnknownFilter(name)) if name == "Nope"));
    }

    #[test]
    fn test_register_closure() {
        let mut registry = FilterRegistry::new();
        registry.register(
            "Invert",
            |input: &RgbaImage, _: &FilterParams| -> Result<RgbaImage, FilterError> {
                Ok(map_rgb(input, |r, g, b| (1.0 - r, 1.0 - g, 1.0 - b)))
            },
        );
        let out = registry.apply("Invert", &gray(55), &FilterParams::new()).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_params_typed_access() {
        let params = FilterParams::new()
            .with(keys::EV, 1.5)
            .with(keys::COLOR, [1.0, 0.0, 0.0, 1.0])
            .with(keys::COLOR_SPACE, "DeviceRGB");

        assert_eq!(params.number(keys::EV).unwrap(), 1.5);
        assert_eq!(params.number_or(keys::RADIUS, 3.0).unwrap(), 3.0);
        assert_eq!(params.text(keys::COLOR_SPACE).unwrap(), "DeviceRGB");
        assert!(matches!(
            params.number(keys::COLOR),
            Err(FilterError::InvalidParameter { .. })
        ));
        assert!(matches!(
            params.point(keys::POINT0),
            Err(FilterError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = FilterParams::new().with(keys::INTENSITY, 1.0);
        base.merge(&FilterParams::new().with(keys::INTENSITY, 0.25));
        assert_eq!(base.number(keys::INTENSITY).unwrap(), 0.25);
    }

    #[test]
    fn test_constant_color() {
        let image = constant_color([0.5, 0.5, 0.5, 1.0], 3, 2);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1), &Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_unit_conversion_round_trips_every_byte() {
        for v in 0..=255u8 {
            assert_eq!(to_u8(to_unit(v)), v);
        }
    }
}
