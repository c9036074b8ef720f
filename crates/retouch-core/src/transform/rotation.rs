//! Arbitrary-angle rotation of RGBA images onto an expanded canvas.
//!
//! Angles are in degrees; positive rotates counter-clockwise as displayed
//! (y pointing down). The canvas grows to the rotated bounding box and
//! uncovered pixels are fully transparent.
//!
//! # Algorithm
//!
//! Inverse mapping: each output pixel centre is rotated back into the
//! source frame and sampled there. Sampling is done on premultiplied
//! colors so transparent surroundings do not darken the edges.
//!
//! ```text
//! src_x = dx * cos(θ) - dy * sin(θ) + src_cx
//! src_y = dx * sin(θ) + dy * cos(θ) + src_cy
//! ```

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Compute the bounding box of a `width` by `height` image rotated by
/// `angle_degrees`.
///
/// ```ignore
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees % 360.0;
    let abs_angle = angle_normalized.abs();

    if abs_angle < 0.001 || (360.0 - abs_angle).abs() < 0.001 || (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Where a point of the source lands after rotating the source about its
/// centre by `angle_degrees` onto a canvas of `dst_size`.
pub fn rotate_point(
    point: (f64, f64),
    src_size: (f64, f64),
    dst_size: (f64, f64),
    angle_degrees: f64,
) -> (f64, f64) {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let dx = point.0 - src_size.0 / 2.0;
    let dy = point.1 - src_size.1 / 2.0;
    (
        dx * cos + dy * sin + dst_size.0 / 2.0,
        -dx * sin + dy * cos + dst_size.1 / 2.0,
    )
}

/// Rotate `image` about its centre onto an expanded, transparent canvas.
pub fn apply_rotation(
    image: &RgbaImage,
    angle_degrees: f64,
    filter: InterpolationFilter,
) -> RgbaImage {
    if angle_degrees.abs() < 0.001 {
        return image.clone();
    }

    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width(), image.height(), angle_degrees);

    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (src_cx, src_cy) = (src_w / 2.0, src_h / 2.0);
    let (dst_cx, dst_cy) = (dst_w as f64 / 2.0, dst_h as f64 / 2.0);

    RgbaImage::from_fn(dst_w, dst_h, |dst_x, dst_y| {
        let dx = dst_x as f64 + 0.5 - dst_cx;
        let dy = dst_y as f64 + 0.5 - dst_cy;

        // Pixel-index coordinates of the sample point in the source
        let src_x = dx * cos - dy * sin + src_cx - 0.5;
        let src_y = dx * sin + dy * cos + src_cy - 0.5;

        match filter {
            InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
            InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
        }
    })
}

/// Premultiplied pixel, transparent outside the image.
#[inline]
fn fetch(image: &RgbaImage, x: i64, y: i64) -> [f64; 4] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return [0.0; 4];
    }
    let p = image.get_pixel(x as u32, y as u32);
    let a = p[3] as f64 / 255.0;
    [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, p[3] as f64]
}

/// Convert an accumulated premultiplied sample back to a straight pixel.
fn unpremultiply(sum: [f64; 4]) -> Rgba<u8> {
    let alpha = sum[3].clamp(0.0, 255.0);
    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let a = alpha / 255.0;
    let channel = |v: f64| (v / a).clamp(0.0, 255.0).round() as u8;
    Rgba([channel(sum[0]), channel(sum[1]), channel(sum[2]), alpha.round() as u8])
}

/// Bilinear interpolation of the 4 nearest pixels.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = fetch(image, x0, y0);
    let p10 = fetch(image, x0 + 1, y0);
    let p01 = fetch(image, x0, y0 + 1);
    let p11 = fetch(image, x0 + 1, y0 + 1);

    let mut sum = [0.0; 4];
    for i in 0..4 {
        sum[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    unpremultiply(sum)
}

/// Lanczos3 interpolation over a 6x6 neighborhood.
fn sample_lanczos3(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;
    for ky in -2..=3 {
        for kx in -2..=3 {
            let (px, py) = (x0 + kx, y0 + ky);
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            let pixel = fetch(image, px, py);
            for i in 0..4 {
                sum[i] += pixel[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    unpremultiply(sum.map(|v| v / weight_sum))
}

/// Lanczos kernel: `L(x) = sinc(x) * sinc(x/a)` for `|x| < a`, else 0.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x + y) * 8) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_no_rotation_is_clone() {
        let img = test_image(30, 20);
        assert_eq!(apply_rotation(&img, 0.0, InterpolationFilter::Bilinear), img);
    }

    #[test]
    fn test_bounds_fast_paths() {
        assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
        assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, -90.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, 180.0), (100, 50));
        assert_eq!(compute_rotated_bounds(100, 50, 360.0), (100, 50));
    }

    #[test]
    fn test_bounds_45_degrees() {
        let (w, h) = compute_rotated_bounds(100, 100, 45.0);
        // 100 * sqrt(2) = 141.42
        assert_eq!((w, h), (141, 141));
    }

    #[test]
    fn test_small_rotation_expands_canvas_with_transparent_corners() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([200, 100, 50, 255]));
        for filter in [InterpolationFilter::Bilinear, InterpolationFilter::Lanczos3] {
            let rotated = apply_rotation(&img, 10.0, filter);
            assert!(rotated.width() > 40 && rotated.height() > 40);
            assert_eq!(rotated.get_pixel(0, 0)[3], 0);
            let center = rotated.get_pixel(rotated.width() / 2, rotated.height() / 2);
            assert_eq!(center, &Rgba([200, 100, 50, 255]), "{filter:?}");
        }
    }

    #[test]
    fn test_edges_are_not_darkened() {
        let img = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        let rotated = apply_rotation(&img, 30.0, InterpolationFilter::Bilinear);
        for pixel in rotated.pixels().filter(|p| p[3] > 0) {
            assert!(pixel[0] >= 254, "edge pixel darkened: {pixel:?}");
        }
    }

    #[test]
    fn test_quarter_turn_matches_point_mapping() {
        // Mark one pixel, rotate 90 degrees counter-clockwise and find it
        let mut img = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 0, 255]));
        img.put_pixel(5, 0, Rgba([255, 0, 0, 255]));
        let rotated = apply_rotation(&img, 90.0, InterpolationFilter::Bilinear);
        assert_eq!(rotated.dimensions(), (4, 6));

        let (x, y) = rotate_point((5.5, 0.5), (6.0, 4.0), (4.0, 6.0), 90.0);
        assert!((x - 0.5).abs() < 1e-9 && (y - 0.5).abs() < 1e-9);
        assert_eq!(rotated.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_rotate_point_center_is_fixed() {
        let (x, y) = rotate_point((50.0, 25.0), (100.0, 50.0), (120.0, 80.0), 17.0);
        assert!((x - 60.0).abs() < 1e-9 && (y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_lanczos_weight() {
        assert_eq!(lanczos_weight(0.0, 3.0), 1.0);
        assert_eq!(lanczos_weight(3.0, 3.0), 0.0);
        assert!(lanczos_weight(1.0, 3.0).abs() < 1e-10);
    }
}
