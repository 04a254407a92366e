//! Sub-configuration structs with their defaults.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resampling and preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Medium and small widths for non-16:9 exports
    pub variant_widths: Vec<u32>,

    /// Filter used for every upscale and downscale
    pub resample_method: ResampleMethod,

    /// Interactive previews are downscaled to at most this width
    pub preview_max_width: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            variant_widths: vec![960, 480],
            resample_method: ResampleMethod::Lanczos3,
            preview_max_width: 1600,
        }
    }
}

/// Resampling filter choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    #[serde(alias = "lanczos", alias = "LANCZOS")]
    Lanczos3,
    #[serde(alias = "bicubic", alias = "BICUBIC")]
    CatmullRom,
    Gaussian,
    #[serde(alias = "bilinear", alias = "BILINEAR")]
    Triangle,
    #[serde(alias = "NEAREST")]
    Nearest,
}

impl ResampleMethod {
    /// The `image` crate filter implementing this method.
    pub fn filter(self) -> FilterType {
        match self {
            ResampleMethod::Lanczos3 => FilterType::Lanczos3,
            ResampleMethod::CatmullRom => FilterType::CatmullRom,
            ResampleMethod::Gaussian => FilterType::Gaussian,
            ResampleMethod::Triangle => FilterType::Triangle,
            ResampleMethod::Nearest => FilterType::Nearest,
        }
    }
}

/// Unsharp mask applied after every resample step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenConfig {
    /// Strength of the mask (1.2 = 120%); 0 disables post-resample sharpening
    pub amount: f32,

    /// Gaussian sigma in output pixels
    pub radius: f32,

    /// Minimum difference (0-255) before a pixel is sharpened
    pub threshold: u8,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            amount: 1.2,
            radius: 1.2,
            threshold: 3,
        }
    }
}

/// WebP export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Lossy quality 0-100
    pub quality: u8,

    /// libwebp method 0-6 (higher = slower, smaller)
    pub effort: u8,

    /// Filename prefix of the largest variant
    pub max_prefix: String,

    /// Filename prefix of the medium variant
    pub medium_prefix: String,

    /// Filename prefix of the smallest variant
    pub small_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            effort: 6,
            max_prefix: "__".to_string(),
            medium_prefix: "_".to_string(),
            small_prefix: String::new(),
        }
    }
}

/// Undo/redo settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Oldest entries are dropped beyond this many
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// Thumbnail cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Longest edge of a cached thumbnail (freedesktop "normal" = 256)
    pub size: u32,

    /// Thumbnails kept in memory; older ones are served from disk (0 disables)
    pub memory_entries: usize,

    /// Override for the cache directory; defaults to `$XDG_CACHE_HOME/thumbnails/normal`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: 256,
            memory_entries: 256,
            cache_dir: None,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 200,
            max_image_dimension: 20000,
            decode_timeout_ms: 15000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
