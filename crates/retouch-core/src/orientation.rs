//! Orientation algebra over the eight symmetries of a rectangle.
//!
//! An [`Orientation`] describes how the rows and columns of a stored pixel
//! buffer map to displayed rows and columns. The eight values correspond
//! one-to-one to the EXIF orientation tags 1-8 and form the dihedral group
//! D4 under [`Orientation::compose`].
//!
//! # Conventions
//!
//! - `compose(a, b)` means "first apply `a`, then apply `b`".
//! - `between(a, b)` is a separate, pinned table: the orientation `x` with
//!   `compose(x, a) == b`. It agrees with `compose(inverse(a), b)` only on the
//!   subgroup that does not swap axes.
//! - Affine matrices are laid out like a 2D graphics context transform:
//!   `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Image orientation, ordered like the EXIF orientation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Row 0 is at the top, column 0 is on the left.
    #[default]
    Normal = 1,
    /// Row 0 is at the top, column 0 is on the right.
    FlipX = 2,
    /// Row 0 is at the bottom, column 0 is on the right.
    Rotate180 = 3,
    /// Row 0 is at the bottom, column 0 is on the left.
    FlipY = 4,
    /// Row 0 is on the left, column 0 is at the top.
    Transpose = 5,
    /// Row 0 is on the right, column 0 is at the top.
    Rotate90 = 6,
    /// Row 0 is on the right, column 0 is at the bottom.
    Transverse = 7,
    /// Row 0 is on the left, column 0 is at the bottom.
    Rotate270 = 8,
}

use Orientation::*;

/// All orientations in EXIF order (tag value - 1 = index).
pub const ALL_ORIENTATIONS: [Orientation; 8] = [
    Normal, FlipX, Rotate180, FlipY, Transpose, Rotate90, Transverse, Rotate270,
];

/// `COMPOSE[a][b]`: apply `a` first, then `b`.
#[rustfmt::skip]
const COMPOSE: [[Orientation; 8]; 8] = [
    [Normal,     FlipX,      Rotate180,  FlipY,      Transpose,  Rotate90,   Transverse, Rotate270],
    [FlipX,      Normal,     FlipY,      Rotate180,  Rotate270,  Transverse, Rotate90,   Transpose],
    [Rotate180,  FlipY,      Normal,     FlipX,      Transverse, Rotate270,  Transpose,  Rotate90 ],
    [FlipY,      Rotate180,  FlipX,      Normal,     Rotate90,   Transpose,  Rotate270,  Transverse],
    [Transpose,  Rotate90,   Transverse, Rotate270,  Normal,     FlipX,      Rotate180,  FlipY    ],
    [Rotate90,   Transpose,  Rotate270,  Transverse, FlipY,      Rotate180,  FlipX,      Normal   ],
    [Transverse, Rotate270,  Transpose,  Rotate90,   Rotate180,  FlipY,      Normal,     FlipX    ],
    [Rotate270,  Transverse, Rotate90,   Transpose,  FlipX,      Normal,     FlipY,      Rotate180],
];

/// `BETWEEN[a][b]`: the orientation that maps frame `a` onto frame `b`.
#[rustfmt::skip]
const BETWEEN: [[Orientation; 8]; 8] = [
    [Normal,     FlipX,      Rotate180,  FlipY,      Transpose,  Rotate90,   Transverse, Rotate270],
    [FlipX,      Normal,     FlipY,      Rotate180,  Rotate90,   Transpose,  Rotate270,  Transverse],
    [Rotate180,  FlipY,      Normal,     FlipX,      Transverse, Rotate270,  Transpose,  Rotate90 ],
    [FlipY,      Rotate180,  FlipX,      Normal,     Rotate270,  Transverse, Rotate90,   Transpose],
    [Transpose,  Rotate270,  Transverse, Rotate90,   Normal,     FlipY,      Rotate180,  FlipX    ],
    [Rotate270,  Transpose,  Rotate90,   Transverse, FlipY,      Normal,     FlipX,      Rotate180],
    [Transverse, Rotate90,   Transpose,  Rotate270,  Rotate180,  FlipX,      Normal,     FlipY    ],
    [Rotate90,   Transverse, Rotate270,  Transpose,  FlipX,      Rotate180,  FlipY,      Normal   ],
];

impl Orientation {
    #[inline]
    fn index(self) -> usize {
        self as usize - 1
    }

    /// Create from an EXIF orientation tag (1-8). Returns `None` for anything else.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1..=8 => Some(ALL_ORIENTATIONS[value as usize - 1]),
            _ => None,
        }
    }

    /// The EXIF orientation tag value (1-8).
    pub fn to_exif(self) -> u8 {
        self as u8
    }

    /// Concatenate two orientations: first apply `self`, then `other`.
    pub fn compose(self, other: Self) -> Self {
        COMPOSE[self.index()][other.index()]
    }

    /// The orientation that maps `self`'s frame onto `other`'s frame.
    ///
    /// Satisfies `self.between(other).compose(self) == other`.
    pub fn between(self, other: Self) -> Self {
        BETWEEN[self.index()][other.index()]
    }

    /// The inverse orientation: `self.compose(self.inverse()) == Normal`.
    pub fn inverse(self) -> Self {
        match self {
            Rotate90 => Rotate270,
            Rotate270 => Rotate90,
            other => other,
        }
    }

    /// Returns true if this orientation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Transpose | Rotate90 | Transverse | Rotate270)
    }

    /// Returns true for the four reflections.
    ///
    /// Straightening is defined relative to the visual frame, so a mirrored
    /// orientation flips the sign of the straighten angle.
    #[inline]
    pub fn is_mirrored(self) -> bool {
        matches!(self, FlipX | FlipY | Transpose | Transverse)
    }

    /// Dimensions of a `width` x `height` buffer once this orientation is applied.
    pub fn oriented_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// The affine transform that maps an object of the given size through
    /// this orientation.
    pub fn affine_transform(self, width: f64, height: f64) -> AffineTransform {
        let (a, b, c, d, tx, ty) = match self {
            Normal => (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            FlipX => (-1.0, 0.0, 0.0, 1.0, width, 0.0),
            Rotate180 => (-1.0, 0.0, 0.0, -1.0, width, height),
            FlipY => (1.0, 0.0, 0.0, -1.0, 0.0, height),
            Transpose => (0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            Rotate90 => (0.0, -1.0, 1.0, 0.0, 0.0, width),
            Transverse => (0.0, -1.0, -1.0, 0.0, height, width),
            Rotate270 => (0.0, 1.0, -1.0, 0.0, height, 0.0),
        };
        AffineTransform { a, b, c, d, tx, ty }
    }

    /// Relabel a pixel buffer so it displays upright under this orientation.
    ///
    /// `apply_to_image(compose(a, b))` equals applying `a` then `b`.
    pub fn apply_to_image(self, mut image: RgbaImage) -> RgbaImage {
        match self {
            Normal => image,
            FlipX => {
                imageops::flip_horizontal_in_place(&mut image);
                image
            }
            Rotate180 => {
                imageops::rotate180_in_place(&mut image);
                image
            }
            FlipY => {
                imageops::flip_vertical_in_place(&mut image);
                image
            }
            Transpose => {
                let mut rotated = imageops::rotate90(&image);
                imageops::flip_horizontal_in_place(&mut rotated);
                rotated
            }
            Rotate90 => imageops::rotate90(&image),
            Transverse => {
                let mut rotated = imageops::rotate270(&image);
                imageops::flip_horizontal_in_place(&mut rotated);
                rotated
            }
            Rotate270 => imageops::rotate270(&image),
        }
    }
}

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// A pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// A rotation by `angle` radians about the origin.
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a point through the transform.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// The transform that applies `self` first, then `other`.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }

    /// The inverse transform, or `None` if the matrix is singular.
    pub fn inverted(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    /// The linear part `(a, b, c, d)`.
    pub fn linear(&self) -> (f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.d)
    }
}
