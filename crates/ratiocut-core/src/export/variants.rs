//! Variant selection and file naming.

use serde::Serialize;

use crate::config::{ExportConfig, ProcessingConfig};
use crate::geometry::{AspectRatio, CropRect};

/// Aspect-ratio class of an export crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    Landscape16x9,
    Portrait9x16,
    Other,
}

/// Largest relative deviation from 16:9 (or 9:16) still classified as video.
const CLASS_TOLERANCE: f64 = 0.01;

impl AspectClass {
    /// Classify a crop.
    ///
    /// A video class needs the usual one-pixel ratio match and a ratio within
    /// 1% of the target, so tiny crops that only pass on rounding stay `Other`.
    pub fn of(crop: &CropRect) -> Self {
        if is_close(AspectRatio::LANDSCAPE_16_9, crop) {
            AspectClass::Landscape16x9
        } else if is_close(AspectRatio::PORTRAIT_9_16, crop) {
            AspectClass::Portrait9x16
        } else {
            AspectClass::Other
        }
    }

    fn ratio_tag(self) -> Option<&'static str> {
        match self {
            AspectClass::Landscape16x9 => Some("16x9"),
            AspectClass::Portrait9x16 => Some("9x16"),
            AspectClass::Other => None,
        }
    }
}

fn is_close(ratio: AspectRatio, crop: &CropRect) -> bool {
    if !ratio.matches(crop.width, crop.height) {
        return false;
    }
    let actual = crop.width as f64 / crop.height as f64;
    ((actual - ratio.value()) / ratio.value()).abs() <= CLASS_TOLERANCE
}

/// One output file of an export batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportVariant {
    /// Short name used in logs and errors ("max", "960", "4k", ...)
    pub label: String,
    /// Output width; `None` keeps the crop's native width
    pub target_width: Option<u32>,
    /// Resolution tag for standard video sizes ("4k", "1080p", "720p")
    pub resolution_label: Option<&'static str>,
    prefix: String,
    suffix: String,
}

impl ExportVariant {
    /// Output file name for `stem`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}{}{}.webp", self.prefix, stem, self.suffix)
    }
}

/// Standard video resolutions: (label, landscape width, portrait width).
const VIDEO_SIZES: [(&str, u32, u32); 3] = [("4k", 3840, 2160), ("1080p", 1920, 1080), ("720p", 1280, 720)];

/// The three variants for `crop`, largest first.
pub fn select_variants(
    crop: &CropRect,
    export: &ExportConfig,
    processing: &ProcessingConfig,
) -> Vec<ExportVariant> {
    let class = AspectClass::of(crop);
    let prefixes = [
        export.max_prefix.clone(),
        export.medium_prefix.clone(),
        export.small_prefix.clone(),
    ];

    match class.ratio_tag() {
        Some(tag) => VIDEO_SIZES
            .iter()
            .zip(prefixes)
            .map(|(&(label, landscape, portrait), prefix)| {
                let width = if class == AspectClass::Landscape16x9 {
                    landscape
                } else {
                    portrait
                };
                ExportVariant {
                    label: label.to_string(),
                    target_width: Some(width),
                    resolution_label: Some(label),
                    prefix,
                    suffix: format!("_{label}_{tag}"),
                }
            })
            .collect(),
        None => {
            let medium = processing.variant_widths.first().copied().unwrap_or(960);
            let small = processing.variant_widths.get(1).copied().unwrap_or(480);
            let widths = [None, Some(medium), Some(small)];
            widths
                .into_iter()
                .zip(prefixes)
                .map(|(target_width, prefix)| ExportVariant {
                    label: target_width.map_or_else(|| "max".to_string(), |w| w.to_string()),
                    target_width,
                    resolution_label: None,
                    prefix,
                    suffix: String::new(),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(crop: CropRect) -> Vec<String> {
        select_variants(&crop, &ExportConfig::default(), &ProcessingConfig::default())
            .iter()
            .map(|v| v.file_name("dunes"))
            .collect()
    }

    #[test]
    fn test_landscape_16_9_names() {
        assert_eq!(
            names(CropRect::new(0, 0, 4000, 2250)),
            [
                "__dunes_4k_16x9.webp",
                "_dunes_1080p_16x9.webp",
                "dunes_720p_16x9.webp"
            ]
        );
    }

    #[test]
    fn test_portrait_9_16_widths() {
        let variants = select_variants(
            &CropRect::new(0, 0, 1125, 2000),
            &ExportConfig::default(),
            &ProcessingConfig::default(),
        );
        let widths: Vec<_> = variants.iter().map(|v| v.target_width).collect();
        assert_eq!(widths, [Some(2160), Some(1080), Some(720)]);
        assert_eq!(variants[0].file_name("x"), "__x_4k_9x16.webp");
    }

    #[test]
    fn test_other_ratio_uses_prefix_scheme() {
        assert_eq!(
            names(CropRect::new(0, 0, 1000, 1000)),
            ["__dunes.webp", "_dunes.webp", "dunes.webp"]
        );
        let variants = select_variants(
            &CropRect::new(0, 0, 1000, 1000),
            &ExportConfig::default(),
            &ProcessingConfig::default(),
        );
        assert_eq!(variants[0].target_width, None);
        assert_eq!(variants[1].target_width, Some(960));
        assert_eq!(variants[2].label, "480");
    }

    #[test]
    fn test_near_16_9_within_tolerance() {
        assert_eq!(
            AspectClass::of(&CropRect::new(0, 0, 3000, 1688)),
            AspectClass::Landscape16x9
        );
        assert_eq!(
            AspectClass::of(&CropRect::new(0, 0, 3000, 1700)),
            AspectClass::Other
        );
    }

    #[test]
    fn test_tiny_crops_are_not_video_sized() {
        for size in [1, 2, 3] {
            assert_eq!(
                AspectClass::of(&CropRect::new(0, 0, size, size)),
                AspectClass::Other
            );
        }
        assert_eq!(
            AspectClass::of(&CropRect::new(0, 0, 2, 1)),
            AspectClass::Other
        );
        assert_eq!(
            AspectClass::of(&CropRect::new(0, 0, 16, 9)),
            AspectClass::Landscape16x9
        );
        assert_eq!(
            AspectClass::of(&CropRect::new(0, 0, 9, 16)),
            AspectClass::Portrait9x16
        );
        assert_eq!(names(CropRect::new(0, 0, 2, 2))[0], "__dunes.webp");
    }
}
