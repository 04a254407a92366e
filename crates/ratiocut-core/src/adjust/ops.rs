//! Per-pixel operations in normalized [0, 1] channel space.

use image::{imageops, RgbImage};
use rayon::prelude::*;

use super::AdjustmentState;

/// Full-scale temperature (±100) moves the red/blue gains by this much.
pub const TEMPERATURE_GAIN: f32 = 0.4;

/// Full-scale RGB balance (±100) adds this much to a normalized channel.
pub const MAX_BALANCE_OFFSET: f32 = 0.2;

/// Gaussian sigma of the sharpness slider's unsharp mask.
pub(super) const SHARPNESS_SIGMA: f32 = 1.0;

const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

pub(super) fn has_tonal_work(state: &AdjustmentState) -> bool {
    state.temperature != 0
        || !state.rgb_balance.is_neutral()
        || state.brightness != 1.0
        || state.contrast != 1.0
        || state.saturation != 1.0
}

/// Temperature, balance, brightness, contrast and saturation in one pass.
///
/// Each step clamps before the next so the result matches running the
/// steps as separate passes.
pub(super) fn tonal_pass(pixels: &mut RgbImage, state: &AdjustmentState) {
    let t = state.temperature as f32 / 100.0 * TEMPERATURE_GAIN;
    let gains = [1.0 + t, 1.0, 1.0 - t];
    let offsets = [
        state.rgb_balance.r as f32 / 100.0 * MAX_BALANCE_OFFSET,
        state.rgb_balance.g as f32 / 100.0 * MAX_BALANCE_OFFSET,
        state.rgb_balance.b as f32 / 100.0 * MAX_BALANCE_OFFSET,
    ];
    let brightness = state.brightness;
    let contrast = state.contrast;
    let saturation = state.saturation;

    let buf: &mut [u8] = pixels;
    buf.par_chunks_exact_mut(3).for_each(|px| {
        let mut c = [to_unit(px[0]), to_unit(px[1]), to_unit(px[2])];

        for i in 0..3 {
            c[i] = (c[i] * gains[i]).clamp(0.0, 1.0);
            c[i] = (c[i] + offsets[i]).clamp(0.0, 1.0);
            c[i] = (c[i] * brightness).clamp(0.0, 1.0);
            c[i] = ((c[i] - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        }

        if saturation != 1.0 {
            let luma = LUMA[0] * c[0] + LUMA[1] * c[1] + LUMA[2] * c[2];
            for v in c.iter_mut() {
                *v = (luma + (*v - luma) * saturation).clamp(0.0, 1.0);
            }
        }

        for (dst, v) in px.iter_mut().zip(c) {
            *dst = to_byte(v);
        }
    });
}

/// Unsharp mask: `out = src + amount * (src - blur(src, sigma))`.
///
/// A negative amount blends toward the blurred copy. Channel differences
/// smaller than `threshold` (0-255) are left untouched.
pub fn unsharp_mask(src: &RgbImage, sigma: f32, amount: f32, threshold: u8) -> RgbImage {
    if amount == 0.0 || sigma <= 0.0 {
        return src.clone();
    }
    let blurred = imageops::blur(src, sigma);
    let mut out = src.clone();
    let threshold = threshold as f32;

    let dst: &mut [u8] = &mut out;
    dst.par_iter_mut()
        .zip(src.as_raw().par_iter())
        .zip(blurred.as_raw().par_iter())
        .for_each(|((d, &s), &b)| {
            let diff = s as f32 - b as f32;
            if diff.abs() >= threshold {
                *d = (s as f32 + amount * diff).round().clamp(0.0, 255.0) as u8;
            }
        });
    out
}

#[inline]
fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
