//! Observable, mutable edit model with transaction coalescing.
//!
//! Writes made inside a transaction produce exactly one change notification
//! when the outermost transaction ends. Transactions nest through a depth
//! counter. The model is single-writer: the counter is not synchronized, so
//! callers must serialize writes to one instance.

use std::ops::Deref;

use super::{EditModel, FocusType, Point, Rect};
use crate::lens::LensHandle;
use crate::orientation::Orientation;
use crate::ImageHandle;

/// Identifies a change observer registered with [`MutableEditModel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&EditModel) + Send>;

/// A mutable [`EditModel`] that notifies observers after changes.
///
/// Reads go through `Deref<Target = EditModel>`; writes go through the
/// `set_*` methods.
pub struct MutableEditModel {
    model: EditModel,
    change_depth: usize,
    has_pending_change: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

macro_rules! setters {
    ($($(#[$meta:meta])* $setter:ident => $field:ident: $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $setter(&mut self, value: $ty) {
                self.write(|model| &mut model.$field, value);
            }
        )*
    };
}

impl MutableEditModel {
    pub fn new() -> Self {
        Self::from_model(EditModel::default())
    }

    pub fn from_model(model: EditModel) -> Self {
        Self {
            model,
            change_depth: 0,
            has_pending_change: false,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// An immutable copy of the current values.
    pub fn snapshot(&self) -> EditModel {
        self.model.clone()
    }

    /// Register an observer called once per committed change.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&EditModel) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Open a transaction. Must be balanced by [`end_changes`](Self::end_changes).
    pub fn begin_changes(&mut self) {
        self.change_depth += 1;
    }

    /// Close a transaction, notifying observers if this was the outermost
    /// one and anything changed.
    pub fn end_changes(&mut self) {
        if self.change_depth == 0 {
            log::warn!("end_changes called without a matching begin_changes");
            return;
        }
        self.change_depth -= 1;
        self.flush();
    }

    /// Apply several writes with a single change notification.
    pub fn perform_changes(&mut self, changes: impl FnOnce(&mut Self)) {
        self.begin_changes();
        changes(self);
        self.end_changes();
    }

    /// Copy every value from `model`, notifying at most once.
    pub fn copy_values_from(&mut self, model: &EditModel) {
        if self.model != *model {
            self.model = model.clone();
            self.has_pending_change = true;
        }
        self.flush();
    }

    pub fn is_in_transaction(&self) -> bool {
        self.change_depth > 0
    }

    setters! {
        set_applied_orientation => applied_orientation: Orientation;
        set_normalized_crop_rect => normalized_crop_rect: Rect;
        set_straighten_angle => straighten_angle: f64;
        set_auto_enhancement_enabled => auto_enhancement_enabled: bool;
        set_brightness => brightness: f32;
        set_contrast => contrast: f32;
        set_saturation => saturation: f32;
        set_shadows => shadows: f32;
        set_highlights => highlights: f32;
        set_exposure => exposure: f32;
        set_clarity => clarity: f32;
        set_effect_filter_identifier => effect_filter_identifier: String;
        set_effect_filter_intensity => effect_filter_intensity: f32;
        set_focus_type => focus_type: FocusType;
        set_focus_normalized_control_point1 => focus_normalized_control_point1: Point;
        set_focus_normalized_control_point2 => focus_normalized_control_point2: Point;
        set_focus_blur_radius => focus_blur_radius: f32;
        /// Set or clear the overlay composited on top of the result.
        set_overlay_image => overlay_image: Option<ImageHandle>;
        set_lens => lens: Option<LensHandle>;
    }

    fn write<T: PartialEq>(&mut self, field: impl FnOnce(&mut EditModel) -> &mut T, value: T) {
        let slot = field(&mut self.model);
        if *slot != value {
            *slot = value;
            self.has_pending_change = true;
        }
        self.flush();
    }

    fn flush(&mut self) {
        if self.change_depth > 0 || !self.has_pending_change {
            return;
        }
        self.has_pending_change = false;
        log::trace!("edit model changed, notifying {} observers", self.observers.len());
        for (_, observer) in &mut self.observers {
            observer(&self.model);
        }
    }
}

impl Default for MutableEditModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MutableEditModel {
    type Target = EditModel;

    fn deref(&self) -> &EditModel {
        &self.model
    }
}

impl From<EditModel> for MutableEditModel {
    fn from(model: EditModel) -> Self {
        Self::from_model(model)
    }
}

impl std::fmt::Debug for MutableEditModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableEditModel")
            .field("model", &self.model)
            .field("change_depth", &self.change_depth)
            .field("observers", &self.observers.len())
            .finish()
    }
}
