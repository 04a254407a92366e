//! Histogram-driven automatic adjustments.
//!
//! Each mode is a pure function of the pixel data: it reads 256-bin
//! histograms of luminance and of each channel and returns a complete
//! [`AdjustmentState`]. The input raster is never modified.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AdjustmentState, RgbBalance, MAX_BALANCE_OFFSET};
use crate::types::RasterImage;

/// Tail fraction clipped on each side before measuring range (aggressive).
const AGGRESSIVE_CLIP: f64 = 0.01;
/// Brightness may move this far from neutral (aggressive).
const AGGRESSIVE_MAX_BRIGHTNESS: f32 = 0.30;
/// Contrast may rise by at most this much (aggressive).
const AGGRESSIVE_MAX_CONTRAST: f32 = 0.50;
const AGGRESSIVE_MAX_BALANCE: i32 = 40;

const CONSERVATIVE_CLIP: f64 = 0.005;
/// Corrections only apply when the clipped range is narrower than this.
const CONSERVATIVE_GATE: f32 = 0.82;
const CONSERVATIVE_MAX_BRIGHTNESS: f32 = 0.20;
const CONSERVATIVE_MAX_CONTRAST: f32 = 0.30;

const COLOR_ONLY_MAX_BALANCE: i32 = 45;

/// Which heuristic to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoBalanceMode {
    /// Histogram clip: brightness, contrast and channel balance.
    Aggressive,
    /// Only touches images with a compressed tonal range; no color changes.
    Conservative,
    /// Equalizes channel medians; tone is left alone.
    ColorOnly,
}

impl AutoBalanceMode {
    pub const ALL: [AutoBalanceMode; 3] = [
        AutoBalanceMode::Aggressive,
        AutoBalanceMode::Conservative,
        AutoBalanceMode::ColorOnly,
    ];

    /// The next mode in the cycle, wrapping around.
    pub fn next(self) -> Self {
        match self {
            AutoBalanceMode::Aggressive => AutoBalanceMode::Conservative,
            AutoBalanceMode::Conservative => AutoBalanceMode::ColorOnly,
            AutoBalanceMode::ColorOnly => AutoBalanceMode::Aggressive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutoBalanceMode::Aggressive => "aggressive",
            AutoBalanceMode::Conservative => "conservative",
            AutoBalanceMode::ColorOnly => "color_only",
        }
    }
}

impl fmt::Display for AutoBalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoBalanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "aggressive" | "1" => Ok(AutoBalanceMode::Aggressive),
            "conservative" | "2" => Ok(AutoBalanceMode::Conservative),
            "color_only" | "color" | "3" => Ok(AutoBalanceMode::ColorOnly),
            other => Err(format!("unknown auto-balance mode '{other}'")),
        }
    }
}

/// Derive adjustments for `raster` with the given heuristic.
pub fn auto_balance(raster: &RasterImage, mode: AutoBalanceMode) -> AdjustmentState {
    let stats = Histograms::collect(raster);
    let state = match mode {
        AutoBalanceMode::Aggressive => aggressive(&stats),
        AutoBalanceMode::Conservative => conservative(&stats),
        AutoBalanceMode::ColorOnly => color_only(&stats),
    };
    tracing::debug!(%mode, ?state, "auto-balance derived");
    state
}

fn aggressive(stats: &Histograms) -> AdjustmentState {
    let (low, high) = stats.luma_range(AGGRESSIVE_CLIP);
    AdjustmentState {
        brightness: brightness_toward_mid(low, high, AGGRESSIVE_MAX_BRIGHTNESS),
        contrast: contrast_for_range(high - low, 0.5, AGGRESSIVE_MAX_CONTRAST),
        rgb_balance: stats.median_balance(AGGRESSIVE_MAX_BALANCE),
        ..AdjustmentState::NEUTRAL
    }
}

fn conservative(stats: &Histograms) -> AdjustmentState {
    let (low, high) = stats.luma_range(CONSERVATIVE_CLIP);
    if high - low >= CONSERVATIVE_GATE {
        return AdjustmentState::NEUTRAL;
    }
    AdjustmentState {
        brightness: brightness_toward_mid(low, high, CONSERVATIVE_MAX_BRIGHTNESS),
        contrast: contrast_for_range(high - low, 0.3, CONSERVATIVE_MAX_CONTRAST),
        ..AdjustmentState::NEUTRAL
    }
}

fn color_only(stats: &Histograms) -> AdjustmentState {
    AdjustmentState {
        rgb_balance: stats.median_balance(COLOR_ONLY_MAX_BALANCE),
        ..AdjustmentState::NEUTRAL
    }
}

/// Multiplier that moves the midpoint of `[low, high]` toward 0.5.
fn brightness_toward_mid(low: f32, high: f32, max_delta: f32) -> f32 {
    let mid = ((low + high) / 2.0).max(1.0 / 255.0);
    let factor = (0.5 / mid).clamp(1.0 - max_delta, 1.0 + max_delta);
    round_slider(factor)
}

/// Contrast gain that stretches a range of width `range` toward full scale.
fn contrast_for_range(range: f32, strength: f32, max_gain: f32) -> f32 {
    let range = range.max(1.0 / 255.0);
    let gain = ((1.0 / range - 1.0) * strength).clamp(0.0, max_gain);
    round_slider(1.0 + gain)
}

fn round_slider(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Luminance and per-channel 256-bin histograms.
struct Histograms {
    luma: [u64; 256],
    channels: [[u64; 256]; 3],
    total: u64,
}

impl Histograms {
    fn empty() -> Self {
        Self {
            luma: [0; 256],
            channels: [[0; 256]; 3],
            total: 0,
        }
    }

    fn collect(raster: &RasterImage) -> Self {
        raster
            .as_bytes()
            .par_chunks_exact(3)
            .fold(Self::empty, |mut acc, px| {
                let luma = (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
                    .round()
                    .clamp(0.0, 255.0) as usize;
                acc.luma[luma] += 1;
                for (hist, &v) in acc.channels.iter_mut().zip(px) {
                    hist[v as usize] += 1;
                }
                acc.total += 1;
                acc
            })
            .reduce(Self::empty, |mut a, b| {
                for (x, y) in a.luma.iter_mut().zip(b.luma.iter()) {
                    *x += y;
                }
                for (ha, hb) in a.channels.iter_mut().zip(b.channels.iter()) {
                    for (x, y) in ha.iter_mut().zip(hb.iter()) {
                        *x += y;
                    }
                }
                a.total += b.total;
                a
            })
    }

    /// Normalized luminance range after clipping `clip` of the pixels from each tail.
    fn luma_range(&self, clip: f64) -> (f32, f32) {
        let low = percentile(&self.luma, self.total, clip);
        let high = percentile(&self.luma, self.total, 1.0 - clip);
        (low as f32 / 255.0, high as f32 / 255.0)
    }

    /// Balance offsets that move each channel median toward the mean of the medians.
    fn median_balance(&self, limit: i32) -> RgbBalance {
        let medians: Vec<f32> = self
            .channels
            .iter()
            .map(|h| percentile(h, self.total, 0.5) as f32 / 255.0)
            .collect();
        let gray = medians.iter().sum::<f32>() / 3.0;
        let offset = |m: f32| -> i32 {
            let v = ((gray - m) / MAX_BALANCE_OFFSET * 100.0).round() as i32;
            v.clamp(-limit, limit)
        };
        RgbBalance::new(offset(medians[0]), offset(medians[1]), offset(medians[2]))
    }
}

/// Smallest bin whose cumulative count reaches `fraction` of `total`.
fn percentile(hist: &[u64; 256], total: u64, fraction: f64) -> u8 {
    if total == 0 {
        return 0;
    }
    let target = ((total as f64) * fraction).ceil().max(1.0) as u64;
    let mut seen = 0u64;
    for (bin, &count) in hist.iter().enumerate() {
        seen += count;
        if seen >= target {
            return bin as u8;
        }
    }
    255
}
