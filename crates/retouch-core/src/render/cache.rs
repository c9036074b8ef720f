//! Single-slot render cache.

use crate::model::EditModel;
use crate::ImageHandle;

use super::RenderMode;

/// Inputs that produced a rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderKey {
    pub source: ImageHandle,
    pub model: EditModel,
    pub mode: RenderMode,
}

/// Holds at most one rendered output and the key it was rendered for.
#[derive(Debug, Default)]
pub struct RenderCache {
    entry: Option<(RenderKey, ImageHandle)>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached output if it was rendered for `key`.
    pub fn get(&self, key: &RenderKey) -> Option<ImageHandle> {
        match &self.entry {
            Some((cached, output)) if cached == key => Some(output.clone()),
            _ => None,
        }
    }

    /// Replace the slot.
    pub fn store(&mut self, key: RenderKey, output: ImageHandle) {
        self.entry = Some((key, output));
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::trace!("render cache invalidated");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn key(source: &ImageHandle) -> RenderKey {
        RenderKey {
            source: source.clone(),
            model: EditModel::default(),
            mode: RenderMode::all(),
        }
    }

    #[test]
    fn test_hit_and_miss() {
        let source = ImageHandle::new(RgbaImage::new(2, 2));
        let output = ImageHandle::new(RgbaImage::new(2, 2));
        let mut cache = RenderCache::new();
        assert!(cache.get(&key(&source)).is_none());

        cache.store(key(&source), output.clone());
        assert_eq!(cache.get(&key(&source)), Some(output));

        let mut changed = key(&source);
        changed.model.exposure = 1.0;
        assert!(cache.get(&changed).is_none());

        let other = ImageHandle::new(RgbaImage::new(2, 2));
        assert!(cache.get(&key(&other)).is_none());
    }

    #[test]
    fn test_invalidate() {
        let source = ImageHandle::new(RgbaImage::new(1, 1));
        let mut cache = RenderCache::new();
        cache.store(key(&source), source.clone());
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key(&source)).is_none());
    }
}
