//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.variant_widths.iter().any(|&w| w == 0) {
            return Err(ConfigError::ValidationError(
                "processing.variant_widths entries must be > 0".into(),
            ));
        }
        if self.processing.preview_max_width == 0 {
            return Err(ConfigError::ValidationError(
                "processing.preview_max_width must be > 0".into(),
            ));
        }
        if !self.sharpen.amount.is_finite() || self.sharpen.amount < 0.0 {
            return Err(ConfigError::ValidationError(
                "sharpen.amount must be >= 0".into(),
            ));
        }
        if !self.sharpen.radius.is_finite() || self.sharpen.radius <= 0.0 {
            return Err(ConfigError::ValidationError(
                "sharpen.radius must be > 0".into(),
            ));
        }
        if self.export.quality > 100 {
            return Err(ConfigError::ValidationError(
                "export.quality must be between 0 and 100".into(),
            ));
        }
        if self.export.effort > 6 {
            return Err(ConfigError::ValidationError(
                "export.effort must be between 0 and 6".into(),
            ));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "history.capacity must be > 0".into(),
            ));
        }
        if self.thumbnail.size == 0 {
            return Err(ConfigError::ValidationError(
                "thumbnail.size must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
