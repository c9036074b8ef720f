//! Render stage selection.
//!
//! Each flag names one pipeline stage; config files refer to stages by name.

bitflags::bitflags! {
    /// Pipeline stages a renderer runs.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderMode: u16 {
        const ORIENTATION       = 1 << 0;
        const CROP              = 1 << 1;
        const AUTO_ENHANCEMENT  = 1 << 2;
        const FOCUS             = 1 << 3;
        const PHOTO_EFFECT      = 1 << 4;
        const LENS_FILTER       = 1 << 5;
        const COLOR_ADJUSTMENTS = 1 << 6;
        const OVERLAY           = 1 << 7;
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::all()
    }
}

impl RenderMode {
    /// Configuration names of every stage, in pipeline order.
    pub const ALL_STAGE_NAMES: [&'static str; 8] = [
        "auto_enhancement",
        "orientation",
        "crop",
        "focus",
        "photo_effect",
        "lens_filter",
        "color_adjustments",
        "overlay",
    ];

    /// The single stage called `name`.
    pub fn from_stage_name(name: &str) -> Option<Self> {
        match name {
            "orientation" => Some(Self::ORIENTATION),
            "crop" => Some(Self::CROP),
            "auto_enhancement" => Some(Self::AUTO_ENHANCEMENT),
            "focus" => Some(Self::FOCUS),
            "photo_effect" => Some(Self::PHOTO_EFFECT),
            "lens_filter" => Some(Self::LENS_FILTER),
            "color_adjustments" => Some(Self::COLOR_ADJUSTMENTS),
            "overlay" => Some(Self::OVERLAY),
            _ => None,
        }
    }
}
