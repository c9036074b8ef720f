//! Renderer configuration.
//!
//! Loaded from TOML. Every key is optional; unknown keys are rejected to
//! catch typos early.
//!
//! ```toml
//! lut_directory = "assets/luts"
//! interpolation = "Lanczos3"
//! draw_filter = "Bilinear"
//! default_render_mode = ["orientation", "crop", "color_adjustments"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::RenderMode;
use crate::transform::InterpolationFilter;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resampling filter used when scaling output into a draw target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawFilter {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl DrawFilter {
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            DrawFilter::Nearest => imageops::FilterType::Nearest,
            DrawFilter::Bilinear => imageops::FilterType::Triangle,
            DrawFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Settings injected into the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Base directory for relative LUT paths.
    pub lut_directory: PathBuf,
    /// Interpolation for straighten rotation.
    pub interpolation: InterpolationFilter,
    /// Resampling for viewport drawing.
    pub draw_filter: DrawFilter,
    /// Stage names enabled on a fresh renderer. See [`RenderMode::from_stage_name`].
    pub default_render_mode: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lut_directory: PathBuf::from("luts"),
            interpolation: InterpolationFilter::Bilinear,
            draw_filter: DrawFilter::Bilinear,
            default_render_mode: RenderMode::ALL_STAGE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that every stage name is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render_mode().map(|_| ())
    }

    /// The render mode named by `default_render_mode`.
    pub fn render_mode(&self) -> Result<RenderMode, ConfigError> {
        self.default_render_mode
            .iter()
            .try_fold(RenderMode::empty(), |mode, name| {
                RenderMode::from_stage_name(name)
                    .map(|stage| mode | stage)
                    .ok_or_else(|| ConfigError::Validation(format!("unknown render stage: {name}")))
            })
    }
}
