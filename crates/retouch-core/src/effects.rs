//! Photo effect catalog.
//!
//! Maps effect identifiers to filter descriptors. The first entry is always
//! the identity effect [`IDENTITY_EFFECT`], which names no filter engine.
//! LUT based effects use the color cube engine; their cube data is derived
//! from the LUT image at render time.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::filter::{keys, names, FilterParams};

/// Identifier of the effect that leaves the image untouched.
pub const IDENTITY_EFFECT: &str = "None";

/// Edge length of the color cube generated from a LUT image.
pub const CUBE_DIMENSION: usize = 64;

/// Color space every LUT effect is evaluated in.
pub const DEVICE_RGB: &str = "DeviceRGB";

/// Description of one photo effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    pub identifier: String,
    pub display_name: String,
    /// Registry name of the filter that renders the effect.
    pub engine: Option<String>,
    /// LUT image, relative paths resolve against the configured LUT directory.
    pub lut_path: Option<PathBuf>,
    pub params: FilterParams,
}

impl EffectDescriptor {
    /// The no-op effect.
    pub fn identity() -> Self {
        Self {
            identifier: IDENTITY_EFFECT.to_string(),
            display_name: IDENTITY_EFFECT.to_string(),
            engine: None,
            lut_path: None,
            params: FilterParams::new(),
        }
    }

    /// An effect rendered by the filter named `engine`.
    pub fn new(identifier: &str, display_name: &str, engine: &str, params: FilterParams) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            engine: Some(engine.to_string()),
            lut_path: None,
            params,
        }
    }

    /// A color-grading effect backed by a LUT image.
    pub fn lut(identifier: &str, display_name: &str, lut_path: impl Into<PathBuf>) -> Self {
        let params = FilterParams::new()
            .with(keys::CUBE_DIMENSION, CUBE_DIMENSION as f32)
            .with(keys::COLOR_SPACE, DEVICE_RGB);
        Self {
            lut_path: Some(lut_path.into()),
            ..Self::new(identifier, display_name, names::COLOR_CUBE, params)
        }
    }

    pub fn is_identity(&self) -> bool {
        self.engine.is_none()
    }

    /// True when cube data has to be generated from the LUT image, i.e. the
    /// engine is the color cube and no explicit cube data overrides it.
    pub fn is_lut_based(&self) -> bool {
        self.engine.as_deref() == Some(names::COLOR_CUBE)
            && self.lut_path.is_some()
            && !self.params.contains(keys::CUBE_DATA)
    }
}

/// Ordered collection of effects.
#[derive(Debug, Clone)]
pub struct EffectCatalog {
    effects: Vec<EffectDescriptor>,
}

impl EffectCatalog {
    /// Build a catalog, inserting the identity effect first when missing.
    pub fn new(effects: impl IntoIterator<Item = EffectDescriptor>) -> Self {
        let mut effects: Vec<_> = effects
            .into_iter()
            .filter(|e| e.identifier != IDENTITY_EFFECT)
            .collect();
        effects.insert(0, EffectDescriptor::identity());
        Self { effects }
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        let luts = [
            ("K1", "K1"),
            ("K2", "K2"),
            ("K6", "K6"),
            ("KDynamic", "KDynamic"),
            ("Fridge", "Fridge"),
            ("Breeze", "Breeze"),
            ("Orchid", "Orchid"),
            ("Chest", "Chest"),
            ("Front", "Front"),
            ("Fixie", "Fixie"),
            ("X400", "X400"),
            ("BW", "BW"),
            ("AD1920", "1920"),
            ("Lenin", "Lenin"),
            ("Quozi", "Quozi"),
            ("Pola669", "Pola 669"),
            ("PolaSX", "Pola SX"),
            ("Food", "Food"),
            ("Glam", "Glam"),
            ("Celsius", "Celsius"),
            ("Texas", "Texas"),
            ("Lomo", "Lomo"),
        ];

        let mut effects: Vec<_> = luts
            .iter()
            .map(|&(id, name)| EffectDescriptor::lut(id, name, lut_file_name(id)))
            .collect();
        effects.push(EffectDescriptor::new(
            "Sepia",
            "Sepia",
            names::SEPIA_TONE,
            FilterParams::new(),
        ));
        effects.push(EffectDescriptor::new(
            "Mono",
            "Mono",
            names::MONOCHROME,
            FilterParams::new().with(keys::COLOR, [0.6, 0.45, 0.3, 1.0]),
        ));
        Self::new(effects)
    }

    pub fn all(&self) -> &[EffectDescriptor] {
        &self.effects
    }

    /// Find an effect by identifier. A miss is not an error.
    pub fn lookup(&self, identifier: &str) -> Option<&EffectDescriptor> {
        self.effects.iter().find(|e| e.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lut_file_name(identifier: &str) -> PathBuf {
    PathBuf::from(format!("{}.png", identifier.to_lowercase()))
}

static BUILTIN: OnceLock<EffectCatalog> = OnceLock::new();

fn builtin() -> &'static EffectCatalog {
    BUILTIN.get_or_init(EffectCatalog::builtin)
}

/// Every built-in effect, identity first.
pub fn all_effects() -> &'static [EffectDescriptor] {
    builtin().all()
}

/// Find a built-in effect by identifier.
pub fn lookup(identifier: &str) -> Option<&'static EffectDescriptor> {
    builtin().lookup(identifier)
}
