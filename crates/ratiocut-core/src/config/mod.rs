//! Configuration management for ratiocut.
//!
//! Configuration is loaded from the platform config directory with defaults
//! for every key. A missing file or a missing key never fails; values that
//! are present but invalid do.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for ratiocut.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resampling and preview settings
    pub processing: ProcessingConfig,

    /// Post-resample sharpening
    pub sharpen: SharpenConfig,

    /// WebP export settings
    pub export: ExportConfig,

    /// Undo/redo settings
    pub history: HistoryConfig,

    /// Thumbnail cache settings
    pub thumbnail: ThumbnailConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.ratiocut.ratiocut/config.toml
    /// - Linux: ~/.config/ratiocut/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\ratiocut\config\config.toml
    ///
    /// Falls back to ~/.ratiocut/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "ratiocut", "ratiocut")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".ratiocut").join("config.toml")
            })
    }

    /// Resolved thumbnail cache directory (with ~ expansion).
    ///
    /// Follows the freedesktop.org convention for "normal" (256px) thumbnails
    /// unless `thumbnail.cache_dir` overrides it.
    pub fn thumbnail_dir(&self) -> PathBuf {
        if let Some(dir) = &self.thumbnail.cache_dir {
            let path_str = dir.to_string_lossy();
            return PathBuf::from(shellexpand::tilde(&path_str).into_owned());
        }
        directories::BaseDirs::new()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".cache")
            })
            .join("thumbnails")
            .join("normal")
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.variant_widths, vec![960, 480]);
        assert_eq!(config.export.quality, 95);
        assert_eq!(config.export.effort, 6);
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.thumbnail.size, 256);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[export]"));
        assert!(toml.contains("resample_method = \"lanczos3\""));
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.export.quality, 95);
        assert_eq!(config.sharpen.radius, 1.2);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_toml("[sharpen]\namount = 0.5\n").unwrap();
        assert_eq!(config.sharpen.amount, 0.5);
        assert_eq!(config.sharpen.threshold, 3);
        assert_eq!(config.processing.resample_method, ResampleMethod::Lanczos3);
    }

    #[test]
    fn test_resample_method_accepts_legacy_names() {
        let config = Config::from_toml("[processing]\nresample_method = \"LANCZOS\"\n").unwrap();
        assert_eq!(config.processing.resample_method, ResampleMethod::Lanczos3);
    }

    #[test]
    fn test_thumbnail_dir_override_expands_tilde() {
        let mut config = Config::default();
        config.thumbnail.cache_dir = Some(PathBuf::from("/tmp/thumbs"));
        assert_eq!(config.thumbnail_dir(), PathBuf::from("/tmp/thumbs"));
    }

    #[test]
    fn test_thumbnail_dir_default_is_freedesktop_normal() {
        let dir = Config::default().thumbnail_dir();
        assert!(dir.ends_with("thumbnails/normal"));
    }
}
