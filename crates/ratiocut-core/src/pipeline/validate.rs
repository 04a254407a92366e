//! Input validation before decode.

use image::ImageFormat;
use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// The formats a session can be loaded from.
pub const ACCEPTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Validates files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Quick checks before a full decode.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    /// - Magic bytes belong to an accepted format
    pub fn validate(&self, path: &Path) -> Result<ImageFormat, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        self.check_magic_bytes(path)
    }

    fn check_magic_bytes(&self, path: &Path) -> Result<ImageFormat, PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        let mut header = [0u8; 12];
        let bytes_read = file.read(&mut header).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read header: {}", e),
        })?;

        if bytes_read < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        sniff_format(&header[..bytes_read]).ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: describe_unknown(&header[..bytes_read], path),
        })
    }
}

/// Identify an accepted format from the first bytes of a file.
pub fn sniff_format(header: &[u8]) -> Option<ImageFormat> {
    match header {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
        // PNG: 89 50 4E 47
        [0x89, b'P', b'N', b'G', ..] => Some(ImageFormat::Png),
        // WebP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(ImageFormat::WebP),
        // BMP: BM
        [b'B', b'M', ..] => Some(ImageFormat::Bmp),
        // TIFF: II*\0 or MM\0*
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Best-effort name for a rejected file, used in error messages.
fn describe_unknown(header: &[u8], path: &Path) -> String {
    match header {
        [b'G', b'I', b'F', b'8', ..] => "gif".to_string(),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => "heif/avif".to_string(),
        _ => path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_ascii_lowercase(),
    }
}

/// Lowercase name of a format.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(sniff_format(&header), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_magic_bytes_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_format(&header), Some(ImageFormat::Png));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert_eq!(sniff_format(&header), Some(ImageFormat::WebP));
    }

    #[test]
    fn test_riff_without_webp_rejected() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'];
        assert_eq!(sniff_format(&header), None);
    }

    #[test]
    fn test_magic_bytes_tiff_both_orders() {
        assert_eq!(
            sniff_format(&[b'I', b'I', 0x2A, 0x00]),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(
            sniff_format(&[b'M', b'M', 0x00, 0x2A]),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(sniff_format(&[b'I', b'I', 0x00, 0x00]), None);
    }

    #[test]
    fn test_gif_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00\x00\x00").unwrap();

        let err = Validator::new(LimitsConfig::default())
            .validate(&path)
            .unwrap_err();
        match err {
            PipelineError::UnsupportedFormat { format, .. } => assert_eq!(format, "gif"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = Validator::new(LimitsConfig::default())
            .validate(Path::new("/nonexistent/photo.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();
        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = Validator::new(limits).validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { .. }));
    }
}
