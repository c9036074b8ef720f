//! Automatic enhancement.
//!
//! Derives a short chain of filter steps from an image's histogram: a
//! per-channel levels stretch between the 0.5% and 99.5% percentiles, then
//! an exposure nudge that pulls mean luminance towards mid-gray. An image
//! that needs neither gets an empty chain.

use image::RgbaImage;

use crate::filter::{keys, names, FilterError, FilterParams, FilterRegistry};
use crate::histogram::compute_histogram;
use crate::Histogram;

const LOW_PERCENTILE: f64 = 0.005;
const HIGH_PERCENTILE: f64 = 0.995;
/// Channels already spanning this range are left alone.
const CLIP_TOLERANCE: u8 = 2;
/// Channels narrower than this are not stretched.
const MIN_CHANNEL_RANGE: u8 = 32;
const TARGET_LUMINANCE: f64 = 128.0;
const MAX_EXPOSURE_NUDGE: f64 = 0.5;
const MIN_EXPOSURE_NUDGE: f64 = 0.05;

/// One filter application in an enhancement chain.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceStep {
    pub filter: &'static str,
    pub params: FilterParams,
}

/// Compute the enhancement chain for `image`.
pub fn auto_adjustment_chain(image: &RgbaImage) -> Vec<EnhanceStep> {
    let hist = compute_histogram(image);
    if hist.total() == 0 {
        return Vec::new();
    }

    let mut chain = Vec::new();
    let mut black = [0.0f32, 0.0, 0.0, 0.0];
    let mut white = [1.0f32, 1.0, 1.0, 1.0];
    let mut stretched = false;

    for (c, bins) in [&hist.red, &hist.green, &hist.blue].into_iter().enumerate() {
        let lo = Histogram::percentile(bins, LOW_PERCENTILE);
        let hi = Histogram::percentile(bins, HIGH_PERCENTILE);
        if hi.saturating_sub(lo) < MIN_CHANNEL_RANGE {
            continue;
        }
        if lo > CLIP_TOLERANCE || hi < 255 - CLIP_TOLERANCE {
            black[c] = lo as f32 / 255.0;
            white[c] = hi as f32 / 255.0;
            stretched = true;
        }
    }

    if stretched {
        chain.push(EnhanceStep {
            filter: names::LEVELS,
            params: FilterParams::new()
                .with(keys::BLACK_POINT, black)
                .with(keys::WHITE_POINT, white),
        });
    }

    if let Some(ev) = exposure_nudge(&hist, stretched) {
        chain.push(EnhanceStep {
            filter: names::EXPOSURE_ADJUST,
            params: FilterParams::new().with(keys::EV, ev as f32),
        });
    }

    log::trace!("auto enhancement chain has {} steps", chain.len());
    chain
}

/// EV correction towards [`TARGET_LUMINANCE`], estimated after the levels
/// stretch when one is applied.
fn exposure_nudge(hist: &Histogram, stretched: bool) -> Option<f64> {
    let mut mean = hist.mean_luminance();
    if stretched {
        let lo = Histogram::percentile(&hist.luminance, LOW_PERCENTILE) as f64;
        let hi = Histogram::percentile(&hist.luminance, HIGH_PERCENTILE) as f64;
        if hi > lo {
            mean = ((mean - lo) / (hi - lo) * 255.0).clamp(0.0, 255.0);
        }
    }
    if mean < 1.0 {
        return None;
    }

    let ev = (TARGET_LUMINANCE / mean).log2().clamp(-MAX_EXPOSURE_NUDGE, MAX_EXPOSURE_NUDGE);
    (ev.abs() >= MIN_EXPOSURE_NUDGE).then_some(ev)
}

/// Run `chain` over `image` using filters from `registry`.
pub fn apply_chain(
    registry: &FilterRegistry,
    image: &RgbaImage,
    chain: &[EnhanceStep],
) -> Result<RgbaImage, FilterError> {
    let mut current: Option<RgbaImage> = None;
    for step in chain {
        let input = current.as_ref().unwrap_or(image);
        current = Some(registry.apply(step.filter, input, &step.params)?);
    }
    Ok(current.unwrap_or_else(|| image.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Horizontal gray ramp from `lo` to `hi`.
    fn ramp(lo: u8, hi: u8) -> RgbaImage {
        RgbaImage::from_fn(256, 8, |x, _| {
            let v = lo as f32 + (hi - lo) as f32 * x as f32 / 255.0;
            let v = v.round() as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_full_range_mid_image_needs_nothing() {
        let chain = auto_adjustment_chain(&ramp(0, 255));
        assert!(chain.is_empty(), "{chain:?}");
    }

    #[test]
    fn test_flat_image_is_not_stretched() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([128, 128, 128, 255]));
        assert!(auto_adjustment_chain(&image).is_empty());
    }

    #[test]
    fn test_transparent_image_needs_nothing() {
        assert!(auto_adjustment_chain(&RgbaImage::new(4, 4)).is_empty());
    }

    #[test]
    fn test_low_contrast_gets_levels() {
        let chain = auto_adjustment_chain(&ramp(60, 190));
        assert_eq!(chain[0].filter, names::LEVELS);
        let black = chain[0].params.color(keys::BLACK_POINT).unwrap();
        let white = chain[0].params.color(keys::WHITE_POINT).unwrap();
        assert!(black[0] > 0.2 && black[0] < 0.25);
        assert!(white[0] > 0.72 && white[0] < 0.76);
    }

    #[test]
    fn test_dark_image_gets_positive_exposure() {
        let image = RgbaImage::from_fn(256, 4, |x, _| {
            let v = if x < 250 { 30 } else { 255 };
            Rgba([v, v, v, 255])
        });
        let chain = auto_adjustment_chain(&image);
        let step = chain.iter().find(|s| s.filter == names::EXPOSURE_ADJUST).unwrap();
        let ev = step.params.number(keys::EV).unwrap();
        assert!(ev > 0.0 && ev <= 0.5);
    }

    #[test]
    fn test_apply_chain_stretches_range() {
        let registry = FilterRegistry::builtin();
        let image = ramp(60, 190);
        let chain = auto_adjustment_chain(&image);
        let out = apply_chain(&registry, &image, &chain).unwrap();
        assert!(out.get_pixel(0, 0)[0] < 10);
        assert!(out.get_pixel(255, 0)[0] > 245);
    }

    #[test]
    fn test_empty_chain_returns_copy() {
        let image = ramp(0, 255);
        let out = apply_chain(&FilterRegistry::builtin(), &image, &[]).unwrap();
        assert_eq!(out, image);
    }
}
