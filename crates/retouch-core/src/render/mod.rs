//! The renderer: edit model + source image in, bitmap out.
//!
//! A [`Renderer`] owns the current inputs (source image, edit model
//! snapshot, render mode) and keeps the last output in a single-slot cache.
//! Changing any input to a different value drops the cached output right
//! away.
//!
//! ```ignore
//! let mut renderer = Renderer::new(RenderConfig::default());
//! renderer.set_source_image(source);
//! renderer.set_edit_model(model.snapshot());
//! let preview = renderer.output_image();
//! let export = renderer.generate_output_image_data(0.9, Some(Path::new("IMG_0001.jpg")));
//! ```

mod cache;
mod draw;
mod mode;
mod pipeline;
mod queue;

pub use cache::{RenderCache, RenderKey};
pub use draw::{DrawContext, DrawTarget};
pub use mode::RenderMode;
pub use pipeline::{output_size, Pipeline};
pub use queue::SerialQueue;

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::RenderConfig;
use crate::encode::{embed_exif, encode_jpeg, quality_from_unit, SourceMetadata};
use crate::filter::FilterRegistry;
use crate::lut::{CubeDataSource, LutConverter};
use crate::model::{EditModel, Rect};
use crate::ImageHandle;

/// Encoded export output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Renders edit models over one source image.
pub struct Renderer {
    config: RenderConfig,
    pipeline: Arc<Pipeline>,
    cache: Arc<Mutex<RenderCache>>,
    source: Option<ImageHandle>,
    model: Option<EditModel>,
    mode: RenderMode,
    queue: SerialQueue,
    draw_context: Option<DrawContext>,
    draw_contexts_created: usize,
}

impl Renderer {
    /// A renderer with the built-in filters and a LUT converter rooted at
    /// `config.lut_directory`.
    pub fn new(config: RenderConfig) -> Self {
        let cube_source = Arc::new(LutConverter::new(config.lut_directory.clone()));
        Self::with_parts(config, FilterRegistry::builtin(), cube_source)
    }

    pub fn with_parts(
        config: RenderConfig,
        registry: FilterRegistry,
        cube_source: Arc<dyn CubeDataSource>,
    ) -> Self {
        let mode = config.render_mode().unwrap_or_else(|e| {
            log::warn!("{e}; rendering every stage");
            RenderMode::all()
        });
        let pipeline = Pipeline::new(&config, registry, cube_source);
        Self::from_pipeline(config, pipeline, mode)
    }

    /// A renderer around a preassembled pipeline.
    pub fn from_pipeline(config: RenderConfig, pipeline: Pipeline, mode: RenderMode) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            cache: Arc::new(Mutex::new(RenderCache::new())),
            source: None,
            model: None,
            mode,
            queue: SerialQueue::new("retouch-render"),
            draw_context: None,
            draw_contexts_created: 0,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn source_image(&self) -> Option<&ImageHandle> {
        self.source.as_ref()
    }

    pub fn edit_model(&self) -> Option<&EditModel> {
        self.model.as_ref()
    }

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_source_image(&mut self, source: ImageHandle) {
        if self.source.as_ref() != Some(&source) {
            self.source = Some(source);
            self.invalidate();
        }
    }

    pub fn set_edit_model(&mut self, model: EditModel) {
        if self.model.as_ref() != Some(&model) {
            self.model = Some(model);
            self.invalidate();
        }
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    /// Number of times the pipeline has actually run.
    pub fn render_count(&self) -> usize {
        self.pipeline.render_count()
    }

    /// Number of draw contexts built so far.
    pub fn draw_contexts_created(&self) -> usize {
        self.draw_contexts_created
    }

    fn invalidate(&self) {
        lock(&self.cache).invalidate();
    }

    /// Current inputs. Panics when the source image or edit model is unset.
    fn key(&self) -> RenderKey {
        let Some(source) = self.source.clone() else {
            panic!("Renderer has no source image");
        };
        let Some(model) = self.model.clone() else {
            panic!("Renderer has no edit model");
        };
        RenderKey {
            source,
            model,
            mode: self.mode,
        }
    }

    /// The rendered output, from the cache when the inputs are unchanged.
    ///
    /// # Panics
    ///
    /// Panics if no source image or edit model has been set.
    pub fn output_image(&self) -> ImageHandle {
        render(&self.pipeline, &self.cache, self.key())
    }

    /// Size of the output, computed from geometry alone.
    ///
    /// # Panics
    ///
    /// Panics if no source image or edit model has been set.
    pub fn output_image_size(&self) -> (u32, u32) {
        let key = self.key();
        output_size(key.source.width(), key.source.height(), &key.model, key.mode)
    }

    /// Render on the worker thread and wait for the result.
    pub fn new_output_image(&self) -> ImageHandle {
        let key = self.key();
        let pipeline = self.pipeline.clone();
        let cache = self.cache.clone();
        self.queue.run_sync(move || render(&pipeline, &cache, key))
    }

    /// Render on the worker thread and hand the result to `completion` there.
    pub fn create_output_image_with_completion(
        &self,
        completion: impl FnOnce(ImageHandle) + Send + 'static,
    ) {
        let key = self.key();
        let pipeline = self.pipeline.clone();
        let cache = self.cache.clone();
        self.queue.dispatch(move || completion(render(&pipeline, &cache, key)));
    }

    /// Encode the output as JPEG.
    ///
    /// `quality` is in `[0, 1]`. When `metadata_source` is given its EXIF
    /// data is carried over without the orientation tag, and without
    /// region-of-interest tags unless the edit leaves geometry untouched.
    /// Metadata that cannot be read or written back is left out. Returns
    /// `None` only if encoding the pixels fails.
    pub fn generate_output_image_data(
        &self,
        quality: f32,
        metadata_source: Option<&Path>,
    ) -> Option<EncodedImage> {
        let geometry_identity = self.key().model.is_geometry_identity();
        let output = self.output_image();
        let mut data = encode_jpeg(&output, quality_from_unit(quality))
            .map_err(|e| log::warn!("JPEG export failed: {e}"))
            .ok()?;

        if let Some(path) = metadata_source {
            data = with_metadata(data, path, geometry_identity);
        }

        Some(EncodedImage {
            data,
            width: output.width(),
            height: output.height(),
        })
    }

    /// Draw the output into `target`, fitted and centred in `viewport`.
    pub fn draw_output_image_in_context(&mut self, target: &mut dyn DrawTarget, viewport: &Rect) {
        let target_id = target.target_id();
        if self.draw_context.as_ref().map(DrawContext::target_id) != Some(target_id) {
            self.draw_context = Some(DrawContext::new(target_id, self.config.draw_filter));
            self.draw_contexts_created += 1;
        }
        let output = self.output_image();
        if let Some(context) = &self.draw_context {
            context.draw(target, &output, viewport);
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("source", &self.source)
            .field("mode", &self.mode)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// `jpeg` with the sanitized EXIF of `source` embedded, or `jpeg` unchanged
/// when there is nothing to carry over.
fn with_metadata(jpeg: Vec<u8>, source: &Path, geometry_identity: bool) -> Vec<u8> {
    let metadata = match SourceMetadata::from_path(source) {
        Ok(metadata) => metadata.sanitized(geometry_identity),
        Err(e) => {
            log::warn!("exporting without metadata: {e}");
            return jpeg;
        }
    };
    if metadata.is_empty() {
        return jpeg;
    }
    match metadata.to_exif_block().and_then(|block| embed_exif(&jpeg, &block)) {
        Ok(embedded) => embedded,
        Err(e) => {
            log::warn!("exporting without metadata: {e}");
            jpeg
        }
    }
}

fn lock(cache: &Mutex<RenderCache>) -> std::sync::MutexGuard<'_, RenderCache> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}

fn render(pipeline: &Pipeline, cache: &Mutex<RenderCache>, key: RenderKey) -> ImageHandle {
    if let Some(output) = lock(cache).get(&key) {
        log::trace!("render cache hit");
        return output;
    }
    log::trace!("render cache miss");
    let output = ImageHandle::new(pipeline.compose(&key.source, &key.model, key.mode));
    lock(cache).store(key, output.clone());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{names, FilterError, FilterParams};
    use crate::orientation::Orientation;
    use exif::{Field, In, Tag, Value};
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn gray(width: u32, height: u32) -> ImageHandle {
        ImageHandle::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }

    fn renderer_with(source: ImageHandle, model: EditModel) -> Renderer {
        let mut renderer = Renderer::new(RenderConfig::default());
        renderer.set_source_image(source);
        renderer.set_edit_model(model);
        renderer
    }

    /// Registry whose exposure filter counts its invocations.
    fn counting_registry() -> (FilterRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = FilterRegistry::builtin();
        registry.register(
            names::EXPOSURE_ADJUST,
            move |input: &RgbaImage, _: &FilterParams| -> Result<RgbaImage, FilterError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(input.clone())
            },
        );
        (registry, calls)
    }

    #[test]
    fn test_default_model_is_pixel_identical() {
        init_logging();
        let source = gray(100, 100);
        let renderer = renderer_with(source.clone(), EditModel::default());
        let output = renderer.output_image();
        assert_eq!(*output, *source);
        assert_eq!(renderer.output_image_size(), (100, 100));
    }

    #[test]
    fn test_orientation_only_mode() {
        let mut model = EditModel::default();
        model.applied_orientation = Orientation::Rotate90;
        let mut renderer = renderer_with(gray(100, 200), model);
        renderer.set_render_mode(RenderMode::ORIENTATION);
        assert_eq!(renderer.output_image_size(), (200, 100));
        assert_eq!(renderer.output_image().dimensions(), (200, 100));
    }

    #[test]
    fn test_crop_output_size() {
        let mut model = EditModel::default();
        model.normalized_crop_rect = Rect::new(0.25, 0.25, 0.5, 0.5);
        assert!(!model.is_geometry_identity());
        let renderer = renderer_with(gray(100, 100), model);
        assert_eq!(renderer.output_image_size(), (50, 50));
        assert_eq!(renderer.output_image().dimensions(), (50, 50));
    }

    #[test]
    fn test_identity_effect_ignores_intensity() {
        let source = gray(30, 30);
        let mut model = EditModel::default();
        model.effect_filter_intensity = 0.1;
        let low = renderer_with(source.clone(), model.clone()).output_image();
        model.effect_filter_intensity = 1.0;
        let high = renderer_with(source.clone(), model).output_image();
        assert_eq!(*low, *source);
        assert_eq!(*high, *source);
    }

    #[test]
    fn test_output_is_cached() {
        let (registry, calls) = counting_registry();
        let mut renderer = Renderer::with_parts(
            RenderConfig::default(),
            registry,
            Arc::new(LutConverter::new("luts")),
        );
        renderer.set_source_image(gray(10, 10));
        let mut model = EditModel::default();
        model.exposure = 0.5;
        renderer.set_edit_model(model.clone());

        let first = renderer.output_image();
        let second = renderer.output_image();
        assert!(first.ptr_eq(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.render_count(), 1);

        // Setting an equal model keeps the cache.
        renderer.set_edit_model(model.clone());
        assert!(renderer.output_image().ptr_eq(&first));

        model.exposure = 0.75;
        renderer.set_edit_model(model);
        let third = renderer.output_image();
        assert!(!third.ptr_eq(&first));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mode_and_source_changes_invalidate() {
        let mut renderer = renderer_with(gray(10, 10), EditModel::default());
        let first = renderer.output_image();

        renderer.set_render_mode(RenderMode::all());
        assert!(renderer.output_image().ptr_eq(&first));

        renderer.set_render_mode(RenderMode::ORIENTATION);
        let second = renderer.output_image();
        assert!(!second.ptr_eq(&first));

        renderer.set_source_image(gray(10, 10));
        assert!(!renderer.output_image().ptr_eq(&second));
        assert_eq!(renderer.render_count(), 3);
    }

    #[test]
    #[should_panic(expected = "no source image")]
    fn test_output_without_source_panics() {
        let mut renderer = Renderer::new(RenderConfig::default());
        renderer.set_edit_model(EditModel::default());
        renderer.output_image();
    }

    #[test]
    #[should_panic(expected = "no edit model")]
    fn test_output_without_model_panics() {
        let mut renderer = Renderer::new(RenderConfig::default());
        renderer.set_source_image(gray(2, 2));
        renderer.output_image();
    }

    #[test]
    fn test_new_output_image_shares_cache() {
        let renderer = renderer_with(gray(12, 12), EditModel::default());
        let background = renderer.new_output_image();
        assert!(renderer.output_image().ptr_eq(&background));
        assert_eq!(renderer.render_count(), 1);
    }

    #[test]
    fn test_completion_runs_in_order() {
        let renderer = renderer_with(gray(8, 8), EditModel::default());
        let (tx, rx) = mpsc::channel();
        for i in 0..3 {
            let tx = tx.clone();
            renderer.create_output_image_with_completion(move |image| {
                tx.send((i, image.dimensions())).unwrap();
            });
        }
        let results: Vec<_> = (0..3).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(results, vec![(0, (8, 8)), (1, (8, 8)), (2, (8, 8))]);
    }

    #[test]
    fn test_configured_default_mode() {
        let config =
            RenderConfig::from_toml_str("default_render_mode = [\"orientation\"]").unwrap();
        let renderer = Renderer::new(config);
        assert_eq!(renderer.render_mode(), RenderMode::ORIENTATION);
    }

    fn source_file(dir: &Path) -> std::path::PathBuf {
        let metadata = SourceMetadata::from_fields(vec![
            Field {
                tag: Tag::Make,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![b"Retouch".to_vec()]),
            },
            Field {
                tag: Tag::Orientation,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![6]),
            },
            Field {
                tag: Tag::SubjectArea,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![5, 5, 2, 2]),
            },
        ]);
        let jpeg = encode_jpeg(&gray(10, 10), 90).unwrap();
        let jpeg = embed_exif(&jpeg, &metadata.to_exif_block().unwrap()).unwrap();
        let path = dir.join("source.jpg");
        std::fs::write(&path, jpeg).unwrap();
        path
    }

    #[test]
    fn test_export_keeps_region_of_interest_for_identity_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(dir.path());
        let renderer = renderer_with(gray(10, 10), EditModel::default());

        let encoded = renderer.generate_output_image_data(0.9, Some(&path)).unwrap();
        assert_eq!((encoded.width, encoded.height), (10, 10));
        let metadata = SourceMetadata::from_bytes(&encoded.data).unwrap();
        assert!(metadata.contains(Tag::Make));
        assert!(metadata.contains(Tag::SubjectArea));
        assert!(!metadata.contains(Tag::Orientation));
    }

    #[test]
    fn test_export_strips_region_of_interest_after_crop() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(dir.path());
        let mut model = EditModel::default();
        model.normalized_crop_rect = Rect::new(0.0, 0.0, 0.5, 0.5);
        let renderer = renderer_with(gray(10, 10), model);

        let encoded = renderer.generate_output_image_data(0.9, Some(&path)).unwrap();
        assert_eq!((encoded.width, encoded.height), (5, 5));
        let metadata = SourceMetadata::from_bytes(&encoded.data).unwrap();
        assert!(!metadata.contains(Tag::SubjectArea));
        assert!(!metadata.contains(Tag::Orientation));
    }

    #[test]
    fn test_export_without_readable_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_with(gray(6, 4), EditModel::default());
        let encoded = renderer
            .generate_output_image_data(0.5, Some(&dir.path().join("missing.jpg")))
            .unwrap();
        assert_eq!(&encoded.data[0..2], &[0xFF, 0xD8]);
        assert!(image::load_from_memory(&encoded.data).is_ok());
    }

    #[test]
    fn test_export_survives_unwritable_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = SourceMetadata::from_fields(vec![
            Field {
                tag: Tag::Orientation,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![6]),
            },
            Field {
                tag: Tag::XResolution,
                ifd_num: In::THUMBNAIL,
                value: Value::Rational(vec![exif::Rational { num: 72, denom: 1 }]),
            },
        ]);
        let jpeg = encode_jpeg(&gray(10, 10), 90).unwrap();
        let path = dir.path().join("thumbnail_only.jpg");
        let block = metadata.to_exif_block().unwrap();
        std::fs::write(&path, embed_exif(&jpeg, &block).unwrap()).unwrap();

        let renderer = renderer_with(gray(10, 10), EditModel::default());
        let plain = renderer.generate_output_image_data(0.9, None).unwrap();
        let encoded = renderer.generate_output_image_data(0.9, Some(&path)).unwrap();
        assert_eq!(encoded, plain);
        assert!(image::load_from_memory(&encoded.data).is_ok());
    }

    #[test]
    fn test_embedding_failure_keeps_plain_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(dir.path());
        let not_jpeg = b"not a jpeg".to_vec();
        assert_eq!(with_metadata(not_jpeg.clone(), &path, true), not_jpeg);
    }

    #[test]
    fn test_export_fails_for_empty_output() {
        let renderer = renderer_with(ImageHandle::new(RgbaImage::new(0, 0)), EditModel::default());
        assert!(renderer.generate_output_image_data(1.0, None).is_none());
    }

    struct Surface {
        id: u64,
        draws: usize,
    }

    impl DrawTarget for Surface {
        fn target_id(&self) -> u64 {
            self.id
        }

        fn draw_image(&mut self, _: &RgbaImage, _: i64, _: i64) {
            self.draws += 1;
        }
    }

    #[test]
    fn test_draw_context_rebuilt_only_for_new_target() {
        let mut renderer = renderer_with(gray(20, 10), EditModel::default());
        let viewport = Rect::new(0.0, 0.0, 40.0, 40.0);
        let mut first = Surface { id: 1, draws: 0 };
        renderer.draw_output_image_in_context(&mut first, &viewport);
        renderer.draw_output_image_in_context(&mut first, &viewport);
        assert_eq!(renderer.draw_contexts_created(), 1);
        assert_eq!(first.draws, 2);

        let mut second = Surface { id: 2, draws: 0 };
        renderer.draw_output_image_in_context(&mut second, &viewport);
        assert_eq!(renderer.draw_contexts_created(), 2);
        assert_eq!(renderer.render_count(), 1);
    }
}
