//! Image decoding with format detection, validation, and timeout support.

use image::{GenericImageView, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::RasterImage;

use super::validate::{format_to_string, Validator, ACCEPTED_FORMATS};

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
    validator: Validator,
}

/// Result of decoding an image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixels converted to 8-bit RGB
    pub raster: RasterImage,
    /// Content-detected format
    pub format: ImageFormat,
    /// Original file size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Validate, read and decode a file.
    pub async fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        self.validator.validate(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an in-memory buffer on a blocking thread under the configured timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<DecodedImage, PipelineError> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let max_dim = self.limits.max_image_dimension;

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_bytes_sync(bytes, &path_owned, max_dim))
                .await
        })
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode (runs in spawn_blocking).
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        path: &Path,
        max_dim: u32,
    ) -> Result<DecodedImage, PipelineError> {
        use std::io::Cursor;

        let file_size = bytes.len() as u64;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        let format = match reader.format() {
            Some(f) if ACCEPTED_FORMATS.contains(&f) => f,
            Some(f) => {
                return Err(PipelineError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: format_to_string(f),
                })
            }
            None => {
                return Err(PipelineError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: "unknown".to_string(),
                })
            }
        };

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }

        Ok(DecodedImage {
            raster: RasterImage::from(image),
            format,
            file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([10, 200, 30]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_decode_png_to_rgb_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 12, 7);
        let decoded = ImageDecoder::new(LimitsConfig::default())
            .decode(&path)
            .await
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.raster.width(), decoded.raster.height()), (12, 7));
        assert_eq!(decoded.raster.as_rgb().get_pixel(3, 3).0, [10, 200, 30]);
    }

    #[test]
    fn test_format_detected_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "misnamed.jpg", 4, 4);
        let bytes = std::fs::read(&path).unwrap();
        let decoded = ImageDecoder::decode_bytes_sync(bytes, &path, 100).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[test]
    fn test_dimension_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 64, 8);
        let bytes = std::fs::read(&path).unwrap();
        let err = ImageDecoder::decode_bytes_sync(bytes, &path, 32).unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 64, .. }));
    }

    #[test]
    fn test_unknown_bytes_unsupported() {
        let err =
            ImageDecoder::decode_bytes_sync(b"hello world".to_vec(), Path::new("x.txt"), 100)
                .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }
}
