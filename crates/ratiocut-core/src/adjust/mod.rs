//! Parametric color correction.
//!
//! [`apply`] runs a fixed-order chain over an 8-bit RGB raster:
//!
//! ```text
//! temperature → RGB balance → brightness → contrast → saturation → sharpness
//! ```
//!
//! Color-channel corrections come before tonal ones, and sharpening always
//! runs last. [`auto_balance`] derives an [`AdjustmentState`] from the
//! histogram of a raster using one of three heuristics.

mod auto_balance;
mod ops;

pub use auto_balance::{auto_balance, AutoBalanceMode};
pub use ops::{unsharp_mask, MAX_BALANCE_OFFSET, TEMPERATURE_GAIN};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::RasterImage;

/// Bounds for brightness, contrast, saturation and sharpness factors.
pub const FACTOR_RANGE: (f32, f32) = (0.2, 3.0);

/// Bounds for temperature and each RGB-balance channel.
pub const SHIFT_RANGE: (i32, i32) = (-100, 100);

/// Per-channel additive offsets, each in [-100, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbBalance {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl RgbBalance {
    pub const NEUTRAL: RgbBalance = RgbBalance { r: 0, g: 0, b: 0 };

    pub fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// A complete set of adjustment parameters.
///
/// Factors are multiplicative with 1.0 as neutral. Values are never clamped
/// on the way in; [`AdjustmentState::validate`] rejects out-of-range input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentState {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
    pub temperature: i32,
    pub rgb_balance: RgbBalance,
}

impl AdjustmentState {
    /// The identity adjustment.
    pub const NEUTRAL: AdjustmentState = AdjustmentState {
        brightness: 1.0,
        contrast: 1.0,
        saturation: 1.0,
        sharpness: 1.0,
        temperature: 0,
        rgb_balance: RgbBalance::NEUTRAL,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Reject any field outside its declared range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_factor("brightness", self.brightness)?;
        check_factor("contrast", self.contrast)?;
        check_factor("saturation", self.saturation)?;
        check_factor("sharpness", self.sharpness)?;
        check_shift("temperature", self.temperature)?;
        check_shift("rgb_balance.r", self.rgb_balance.r)?;
        check_shift("rgb_balance.g", self.rgb_balance.g)?;
        check_shift("rgb_balance.b", self.rgb_balance.b)?;
        Ok(())
    }
}

impl Default for AdjustmentState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn check_factor(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    let (min, max) = FACTOR_RANGE;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

fn check_shift(field: &'static str, value: i32) -> Result<(), ValidationError> {
    let (min, max) = SHIFT_RANGE;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

/// Apply `state` to `raster`, returning a new raster.
///
/// Validation happens before any pixel is touched. A neutral state returns
/// the input buffer unchanged (shared, not copied).
pub fn apply(raster: &RasterImage, state: &AdjustmentState) -> Result<RasterImage, ValidationError> {
    state.validate()?;
    if state.is_neutral() {
        return Ok(raster.clone());
    }

    let start = std::time::Instant::now();
    let mut pixels = raster.as_rgb().clone();
    if ops::has_tonal_work(state) {
        ops::tonal_pass(&mut pixels, state);
    }
    if state.sharpness != 1.0 {
        pixels = unsharp_mask(&pixels, ops::SHARPNESS_SIGMA, state.sharpness - 1.0, 0);
    }
    tracing::trace!(
        width = raster.width(),
        height = raster.height(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "adjustments applied"
    );
    Ok(RasterImage::new(pixels))
}
