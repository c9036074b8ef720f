//! LUT image to color cube conversion.
//!
//! A LUT image for cube dimension `d` is a square grid of `sqrt(d)` by
//! `sqrt(d)` tiles, each `d` by `d` pixels. Tile `b` (row-major) holds the
//! slice for blue grid coordinate `b`; inside a tile, x is red and y is
//! green. For the default dimension of 64 the image is 512 by 512.
//!
//! The cube handed to the color cube filter interpolates between the
//! identity cube and the LUT's cube by the effect intensity.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::effects::CUBE_DIMENSION;
use crate::filter::{ColorCube, FilterError};

/// Errors that can occur while converting a LUT.
#[derive(Debug, Error)]
pub enum LutError {
    #[error("Failed to read LUT {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Cube dimension {0} is not a perfect square of at least 4")]
    InvalidDimension(usize),

    #[error("LUT image is {found:?}, expected {expected:?}")]
    InvalidLayout {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error(transparent)]
    Cube(#[from] FilterError),
}

/// Produces color cube data for a LUT at a given intensity.
pub trait CubeDataSource: Send + Sync {
    fn color_cube(&self, lut_path: &Path, intensity: f32) -> Result<Arc<ColorCube>, LutError>;
}

/// Tiles per row for `dimension`, or an error if it is not a square.
fn tiles_per_row(dimension: usize) -> Result<usize, LutError> {
    let tiles = (dimension as f64).sqrt().round() as usize;
    if dimension < 4 || tiles * tiles != dimension {
        return Err(LutError::InvalidDimension(dimension));
    }
    Ok(tiles)
}

/// Pixel position of grid coordinate `(r, g, b)` in a LUT image.
#[inline]
fn lut_position(tiles: usize, dimension: usize, r: usize, g: usize, b: usize) -> (u32, u32) {
    let x = (b % tiles) * dimension + r;
    let y = (b / tiles) * dimension + g;
    (x as u32, y as u32)
}

/// Render the identity LUT image for `dimension`.
pub fn generate_identity_lut(dimension: usize) -> Result<RgbaImage, LutError> {
    let tiles = tiles_per_row(dimension)?;
    let side = (tiles * dimension) as u32;
    let scale = 255.0 / (dimension - 1) as f32;
    let level = |v: usize| (v as f32 * scale).round() as u8;

    let mut image = RgbaImage::new(side, side);
    for b in 0..dimension {
        for g in 0..dimension {
            for r in 0..dimension {
                let (x, y) = lut_position(tiles, dimension, r, g, b);
                image.put_pixel(x, y, Rgba([level(r), level(g), level(b), 255]));
            }
        }
    }
    Ok(image)
}

/// Read a LUT image into a color cube.
pub fn cube_from_lut_image(image: &RgbaImage, dimension: usize) -> Result<ColorCube, LutError> {
    let tiles = tiles_per_row(dimension)?;
    let side = (tiles * dimension) as u32;
    if image.dimensions() != (side, side) {
        return Err(LutError::InvalidLayout {
            expected: (side, side),
            found: image.dimensions(),
        });
    }

    let mut data = Vec::with_capacity(dimension * dimension * dimension * 4);
    for b in 0..dimension {
        for g in 0..dimension {
            for r in 0..dimension {
                let (x, y) = lut_position(tiles, dimension, r, g, b);
                let pixel = image.get_pixel(x, y);
                data.extend(pixel.0.iter().map(|&c| c as f32 / 255.0));
            }
        }
    }
    Ok(ColorCube::new(dimension, data)?)
}

/// File-backed [`CubeDataSource`].
///
/// Relative LUT paths resolve against `base_dir`. The most recently read
/// LUT is kept so that intensity changes do not re-read the file.
pub struct LutConverter {
    base_dir: PathBuf,
    dimension: usize,
    identity: ColorCube,
    last_lut: Mutex<Option<(PathBuf, Arc<ColorCube>)>>,
}

impl LutConverter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_dimension(base_dir, CUBE_DIMENSION)
    }

    pub fn with_dimension(base_dir: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            dimension,
            identity: ColorCube::identity(dimension),
            last_lut: Mutex::new(None),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Resolve `lut_path` against the base directory.
    pub fn resolve(&self, lut_path: &Path) -> PathBuf {
        if lut_path.is_absolute() {
            lut_path.to_path_buf()
        } else {
            self.base_dir.join(lut_path)
        }
    }

    /// The full-strength cube for the LUT at `lut_path`.
    pub fn load_cube(&self, lut_path: &Path) -> Result<Arc<ColorCube>, LutError> {
        let path = self.resolve(lut_path);
        let mut last = self.last_lut.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_path, cube)) = last.as_ref() {
            if *cached_path == path {
                return Ok(cube.clone());
            }
        }

        log::debug!("reading LUT {}", path.display());
        let image = image::open(&path)
            .map_err(|e| LutError::Read {
                path: path.clone(),
                message: e.to_string(),
            })?
            .to_rgba8();
        let cube = Arc::new(cube_from_lut_image(&image, self.dimension)?);
        *last = Some((path, cube.clone()));
        Ok(cube)
    }
}

impl CubeDataSource for LutConverter {
    fn color_cube(&self, lut_path: &Path, intensity: f32) -> Result<Arc<ColorCube>, LutError> {
        let lut = self.load_cube(lut_path)?;
        let intensity = intensity.clamp(0.0, 1.0);
        if intensity == 1.0 {
            return Ok(lut);
        }
        Ok(Arc::new(self.identity.interpolate(&lut, intensity)?))
    }
}
