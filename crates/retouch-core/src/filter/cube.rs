//! 3D color cube lookup.

use image::RgbaImage;

use super::{keys, to_u8, to_unit, FilterError, FilterParams};

/// A `dimension³` RGBA lookup table with values in `[0, 1]`.
///
/// Entries are stored red-fastest: the entry for grid coordinates
/// `(r, g, b)` starts at `((b * dimension + g) * dimension + r) * 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCube {
    dimension: usize,
    data: Vec<f32>,
}

impl ColorCube {
    /// Wrap raw cube data, checking its length against `dimension`.
    pub fn new(dimension: usize, data: Vec<f32>) -> Result<Self, FilterError> {
        if dimension < 2 {
            return Err(FilterError::invalid(
                keys::CUBE_DIMENSION,
                format!("dimension {dimension} is below 2"),
            ));
        }
        let expected = dimension * dimension * dimension * 4;
        if data.len() != expected {
            return Err(FilterError::invalid(
                keys::CUBE_DATA,
                format!("expected {expected} values, found {}", data.len()),
            ));
        }
        Ok(Self { dimension, data })
    }

    /// The cube that maps every color to itself.
    pub fn identity(dimension: usize) -> Self {
        let dimension = dimension.max(2);
        let scale = (dimension - 1) as f32;
        let mut data = Vec::with_capacity(dimension * dimension * dimension * 4);
        for b in 0..dimension {
            for g in 0..dimension {
                for r in 0..dimension {
                    data.extend_from_slice(&[
                        r as f32 / scale,
                        g as f32 / scale,
                        b as f32 / scale,
                        1.0,
                    ]);
                }
            }
        }
        Self { dimension, data }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Blend every entry towards `other` by `t` (0 = self, 1 = other).
    pub fn interpolate(&self, other: &ColorCube, t: f32) -> Result<ColorCube, FilterError> {
        if self.dimension != other.dimension {
            return Err(FilterError::invalid(
                keys::CUBE_DIMENSION,
                format!("cannot blend {} with {}", self.dimension, other.dimension),
            ));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + (b - a) * t)
            .collect();
        Ok(ColorCube {
            dimension: self.dimension,
            data,
        })
    }

    #[inline]
    fn entry(&self, r: usize, g: usize, b: usize) -> &[f32] {
        let index = ((b * self.dimension + g) * self.dimension + r) * 4;
        &self.data[index..index + 4]
    }

    /// Trilinear lookup of a color with components in `[0, 1]`.
    pub fn lookup(&self, r: f32, g: f32, b: f32) -> [f32; 4] {
        let scale = (self.dimension - 1) as f32;
        let split = |v: f32| {
            let pos = v.clamp(0.0, 1.0) * scale;
            let lo = (pos.floor() as usize).min(self.dimension - 2);
            (lo, pos - lo as f32)
        };
        let (r0, fr) = split(r);
        let (g0, fg) = split(g);
        let (b0, fb) = split(b);

        let mut out = [0.0f32; 4];
        for (db, wb) in [(0, 1.0 - fb), (1, fb)] {
            for (dg, wg) in [(0, 1.0 - fg), (1, fg)] {
                for (dr, wr) in [(0, 1.0 - fr), (1, fr)] {
                    let weight = wr * wg * wb;
                    if weight == 0.0 {
                        continue;
                    }
                    let entry = self.entry(r0 + dr, g0 + dg, b0 + db);
                    for (o, e) in out.iter_mut().zip(entry) {
                        *o += e * weight;
                    }
                }
            }
        }
        out
    }
}

/// Map colors through `cubeData`, whose dimension must match
/// `cubeDimension` when that parameter is given.
pub fn color_cube(input: &RgbaImage, params: &FilterParams) -> Result<RgbaImage, FilterError> {
    let cube = params.cube(keys::CUBE_DATA)?;
    if params.contains(keys::CUBE_DIMENSION) {
        let dimension = params.number(keys::CUBE_DIMENSION)?;
        if dimension as usize != cube.dimension() {
            return Err(FilterError::invalid(
                keys::CUBE_DIMENSION,
                format!("{dimension} does not match cube data of {}", cube.dimension()),
            ));
        }
    }

    let mut output = input.clone();
    for pixel in output.pixels_mut() {
        let [r, g, b, _] = cube.lookup(to_unit(pixel[0]), to_unit(pixel[1]), to_unit(pixel[2]));
        pixel[0] = to_u8(r);
        pixel[1] = to_u8(g);
        pixel[2] = to_u8(b);
    }
    Ok(output)
}
