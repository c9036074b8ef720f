//! The fixed filter pipeline.
//!
//! Stages run in this order, each only when enabled by the render mode and
//! when its parameters differ from their no-op values:
//!
//! 1. auto enhancement
//! 2. orientation, then crop and straighten
//! 3. focus blur
//! 4. photo effect
//! 5. lens
//! 6. color adjustments (clarity, color controls, exposure, highlights and shadows)
//! 7. overlay
//!
//! A stage that fails is logged and skipped; its input flows on unchanged.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use crate::config::RenderConfig;
use crate::effects::{EffectCatalog, EffectDescriptor};
use crate::enhance::{apply_chain, auto_adjustment_chain};
use crate::filter::{constant_color, keys, names, ColorCube, FilterParams, FilterRegistry};
use crate::lut::{CubeDataSource, LutError};
use crate::model::{EditModel, FocusType, Point, Rect};
use crate::orientation::Orientation;
use crate::transform::{
    apply_crop, apply_rotation, clamp_crop_rect, compute_rotated_bounds, rotate_point,
    InterpolationFilter,
};
use crate::ImageHandle;

use super::RenderMode;

const CLARITY_RADIUS: f32 = 20.0;
const CLARITY_INTENSITY: f32 = 0.5;
const CLARITY_CONTRAST: f32 = 1.1;
const CLARITY_SATURATION: f32 = 1.05;

/// Cube data for the last (LUT path, intensity) pair.
type EffectMemo = Option<(PathBuf, u32, Arc<ColorCube>)>;

/// Composes edit models over source images.
pub struct Pipeline {
    registry: FilterRegistry,
    cube_source: Arc<dyn CubeDataSource>,
    catalog: EffectCatalog,
    interpolation: InterpolationFilter,
    effect_memo: Mutex<EffectMemo>,
    renders: AtomicUsize,
}

impl Pipeline {
    pub fn new(
        config: &RenderConfig,
        registry: FilterRegistry,
        cube_source: Arc<dyn CubeDataSource>,
    ) -> Self {
        Self {
            registry,
            cube_source,
            catalog: EffectCatalog::builtin(),
            interpolation: config.interpolation,
            effect_memo: Mutex::new(None),
            renders: AtomicUsize::new(0),
        }
    }

    /// Replace the effect catalog.
    pub fn with_catalog(mut self, catalog: EffectCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    /// Number of times [`Pipeline::compose`] has run.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    /// Render `model` over `source`.
    pub fn compose(&self, source: &ImageHandle, model: &EditModel, mode: RenderMode) -> RgbaImage {
        self.renders.fetch_add(1, Ordering::Relaxed);
        log::debug!("rendering {}x{} source with {mode:?}", source.width(), source.height());

        let mut image = (**source).clone();

        if mode.contains(RenderMode::AUTO_ENHANCEMENT) && model.auto_enhancement_enabled {
            let chain = auto_adjustment_chain(&image);
            if !chain.is_empty() {
                image = stage("auto enhancement", image, |input| {
                    apply_chain(&self.registry, input, &chain)
                });
            }
        }

        image = self.orient_and_crop(image, model, mode);

        if mode.contains(RenderMode::FOCUS) {
            image = self.focus(image, model);
        }

        if mode.contains(RenderMode::PHOTO_EFFECT) {
            image = self.photo_effect(image, model);
        }

        if mode.contains(RenderMode::LENS_FILTER) {
            if let Some(lens) = &model.lens {
                if let Some(filtered) = lens.run(&image) {
                    image = filtered;
                }
            }
        }

        if mode.contains(RenderMode::COLOR_ADJUSTMENTS) {
            image = self.color_adjustments(image, model);
        }

        if mode.contains(RenderMode::OVERLAY) {
            if let Some(overlay) = &model.overlay_image {
                image = stage("overlay", image, |input| {
                    let background = ImageHandle::new(input.clone());
                    let params = FilterParams::new().with(keys::BACKGROUND, background);
                    self.registry.apply(names::SOURCE_OVER_COMPOSITING, overlay, &params)
                });
            }
        }

        image
    }

    fn orient_and_crop(
        &self,
        mut image: RgbaImage,
        model: &EditModel,
        mode: RenderMode,
    ) -> RgbaImage {
        let orientation = effective_orientation(model, mode);
        if orientation != Orientation::Normal {
            image = orientation.apply_to_image(image);
        }
        if !mode.contains(RenderMode::CROP) {
            return image;
        }

        let degrees = straighten_degrees(model, orientation);
        let (width, height) = (image.width() as f64, image.height() as f64);
        let mut rect = model.normalized_crop_rect.denormalized(width, height);

        if degrees != 0.0 {
            let rotated = apply_rotation(&image, -degrees, self.interpolation);
            let rotated_size = (rotated.width() as f64, rotated.height() as f64);
            rect = straightened_rect(&rect, (width, height), rotated_size, degrees);
            image = rotated;
        }

        if model.normalized_crop_rect.is_identity() {
            return image;
        }
        apply_crop(&image, &rect.rounded())
    }

    fn focus(&self, image: RgbaImage, model: &EditModel) -> RgbaImage {
        let filter = match model.focus_type {
            FocusType::Off => return image,
            FocusType::Linear => names::LINEAR_FOCUS,
            FocusType::Radial => names::RADIAL_FOCUS,
        };
        if model.focus_blur_radius <= 0.0 {
            return image;
        }

        let (width, height) = (image.width() as f64, image.height() as f64);
        let denormalize = |p: Point| Point::new(p.x * width, p.y * height);
        let params = FilterParams::new()
            .with(keys::POINT0, denormalize(model.focus_normalized_control_point1))
            .with(keys::POINT1, denormalize(model.focus_normalized_control_point2))
            .with(keys::RADIUS, model.focus_blur_radius);
        stage("focus", image, |input| self.registry.apply(filter, input, &params))
    }

    fn photo_effect(&self, image: RgbaImage, model: &EditModel) -> RgbaImage {
        let Some(effect) = self.catalog.lookup(&model.effect_filter_identifier) else {
            log::debug!(
                "unknown effect {:?}, rendering without one",
                model.effect_filter_identifier
            );
            return image;
        };
        let Some(engine) = effect.engine.as_deref() else {
            return image;
        };
        let intensity = model.effect_filter_intensity;
        if intensity <= 0.0 {
            return image;
        }

        let params = match self.effect_params(effect, intensity) {
            Ok(params) => params,
            Err(e) => {
                log::warn!("skipping effect {}: {e}", effect.identifier);
                return image;
            }
        };
        stage("photo effect", image, |input| self.registry.apply(engine, input, &params))
    }

    fn effect_params(
        &self,
        effect: &EffectDescriptor,
        intensity: f32,
    ) -> Result<FilterParams, LutError> {
        let mut params = effect.params.clone();
        match (&effect.lut_path, effect.is_lut_based()) {
            (Some(lut_path), true) => {
                let cube = self.effect_cube(lut_path, intensity)?;
                params.insert(keys::CUBE_DIMENSION, cube.dimension() as f32);
                params.insert(keys::CUBE_DATA, cube);
            }
            _ => params.insert(keys::INTENSITY, intensity),
        }
        Ok(params)
    }

    fn effect_cube(&self, lut_path: &Path, intensity: f32) -> Result<Arc<ColorCube>, LutError> {
        let mut memo = self.effect_memo.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((path, bits, cube)) = memo.as_ref() {
            if path == lut_path && *bits == intensity.to_bits() {
                return Ok(cube.clone());
            }
        }
        log::debug!("generating cube data for {} at {intensity}", lut_path.display());
        let cube = self.cube_source.color_cube(lut_path, intensity)?;
        *memo = Some((lut_path.to_path_buf(), intensity.to_bits(), cube.clone()));
        Ok(cube)
    }

    fn color_adjustments(&self, mut image: RgbaImage, model: &EditModel) -> RgbaImage {
        if model.clarity != 0.0 {
            image = stage("clarity", image, |input| self.clarity(input, model.clarity));
        }
        if !model.has_identity_color_controls() {
            let params = FilterParams::new()
                .with(keys::BRIGHTNESS, model.brightness)
                .with(keys::CONTRAST, model.contrast)
                .with(keys::SATURATION, model.saturation);
            image = stage("color controls", image, |input| {
                self.registry.apply(names::COLOR_CONTROLS, input, &params)
            });
        }
        if model.exposure != 0.0 {
            let params = FilterParams::new().with(keys::EV, model.exposure);
            image = stage("exposure", image, |input| {
                self.registry.apply(names::EXPOSURE_ADJUST, input, &params)
            });
        }
        if !model.has_identity_highlight_shadow() {
            let params = FilterParams::new()
                .with(keys::HIGHLIGHTS, model.highlights)
                .with(keys::SHADOWS, model.shadows);
            image = stage("highlights and shadows", image, |input| {
                self.registry.apply(names::HIGHLIGHT_SHADOW_ADJUST, input, &params)
            });
        }
        image
    }

    /// Sharpened, slightly punchier copy blended over `input` by `amount`.
    fn clarity(
        &self,
        input: &RgbaImage,
        amount: f32,
    ) -> Result<RgbaImage, crate::filter::FilterError> {
        let sharpened = self.registry.apply(
            names::UNSHARP_MASK,
            input,
            &FilterParams::new()
                .with(keys::RADIUS, CLARITY_RADIUS)
                .with(keys::INTENSITY, CLARITY_INTENSITY),
        )?;
        let punchy = self.registry.apply(
            names::COLOR_CONTROLS,
            &sharpened,
            &FilterParams::new()
                .with(keys::CONTRAST, CLARITY_CONTRAST)
                .with(keys::SATURATION, CLARITY_SATURATION),
        )?;
        let mask = constant_color([amount, amount, amount, 1.0], input.width(), input.height());
        let params = FilterParams::new()
            .with(keys::BACKGROUND, ImageHandle::new(input.clone()))
            .with(keys::MASK, ImageHandle::new(mask));
        self.registry.apply(names::BLEND_WITH_MASK, &punchy, &params)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("effects", &self.catalog.len())
            .field("interpolation", &self.interpolation)
            .finish()
    }
}

/// Run one stage, keeping `image` when it fails.
fn stage<E: Display>(
    name: &str,
    image: RgbaImage,
    run: impl FnOnce(&RgbaImage) -> Result<RgbaImage, E>,
) -> RgbaImage {
    match run(&image) {
        Ok(output) => output,
        Err(e) => {
            log::warn!("skipping {name} stage: {e}");
            image
        }
    }
}

fn effective_orientation(model: &EditModel, mode: RenderMode) -> Orientation {
    if mode.contains(RenderMode::ORIENTATION) {
        model.applied_orientation
    } else {
        Orientation::Normal
    }
}

/// Straighten angle in degrees as seen in the oriented frame.
fn straighten_degrees(model: &EditModel, orientation: Orientation) -> f64 {
    let degrees = model.straighten_angle.to_degrees();
    if orientation.is_mirrored() {
        -degrees
    } else {
        degrees
    }
}

/// `rect` moved so its centre follows a rotation by `-degrees` from a
/// canvas of `size` onto one of `rotated_size`. Its size is unchanged.
fn straightened_rect(
    rect: &Rect,
    size: (f64, f64),
    rotated_size: (f64, f64),
    degrees: f64,
) -> Rect {
    let center = rect.center();
    let (cx, cy) = rotate_point((center.x, center.y), size, rotated_size, -degrees);
    Rect::new(cx - rect.width / 2.0, cy - rect.height / 2.0, rect.width, rect.height)
}

/// Output size of `model` over a `width` by `height` source, without
/// rendering any pixels.
pub fn output_size(width: u32, height: u32, model: &EditModel, mode: RenderMode) -> (u32, u32) {
    let orientation = effective_orientation(model, mode);
    let (mut width, mut height) = orientation.oriented_size(width, height);
    if !mode.contains(RenderMode::CROP) {
        return (width, height);
    }

    let mut rect = model.normalized_crop_rect.denormalized(width as f64, height as f64);
    let degrees = straighten_degrees(model, orientation);
    if degrees != 0.0 {
        let oriented = (width as f64, height as f64);
        (width, height) = compute_rotated_bounds(width, height, -degrees);
        rect = straightened_rect(&rect, oriented, (width as f64, height as f64), degrees);
    }
    if model.normalized_crop_rect.is_identity() {
        return (width, height);
    }
    let region = clamp_crop_rect(&rect.rounded(), width, height);
    (region.width, region.height)
}
