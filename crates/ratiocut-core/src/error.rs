//! Error types for the ratiocut editing engine.
//!
//! Errors are organized by component so the caller can tell a rejected
//! request (bad geometry, out-of-range slider value) from an environmental
//! failure (disk full, undecodable file). Every error answers
//! `is_retryable()` so the UI layer can decide whether to offer a retry.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for ratiocut operations.
#[derive(Error, Debug)]
pub enum RatiocutError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid crop rectangle or ratio
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Out-of-range adjustment value
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Decode / render errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Session state errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Variant export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Thumbnail cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RatiocutError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RatiocutError::Pipeline(e) => e.is_retryable(),
            RatiocutError::Session(e) => e.is_retryable(),
            RatiocutError::Export(e) => e.is_retryable(),
            RatiocutError::Cache(e) => e.is_retryable(),
            RatiocutError::Io(e) => is_retryable_io(e),
            RatiocutError::Config(_)
            | RatiocutError::Geometry(_)
            | RatiocutError::Validation(_) => false,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Invalid crop rectangles and ratios.
///
/// The caller keeps its previous valid rectangle when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Width or height is zero
    #[error("Crop rectangle has non-positive size {width}x{height}")]
    NonPositive { width: u32, height: u32 },

    /// Rectangle leaves the image
    #[error(
        "Crop rectangle {x},{y} {width}x{height} exceeds image bounds {image_width}x{image_height}"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Rectangle does not honor the locked ratio
    #[error("Crop rectangle {width}x{height} does not match ratio {expected:.4}")]
    RatioMismatch {
        width: u32,
        height: u32,
        expected: f64,
    },

    /// Ratio components must be positive and finite
    #[error("Invalid aspect ratio {width}:{height}")]
    InvalidRatio { width: f64, height: f64 },

    /// Display-space selection does not overlap the image
    #[error("Selection contains no visible part of the image")]
    EmptySelection,

    /// Canvas scale must be positive and finite
    #[error("Invalid canvas scale {0}")]
    InvalidScale(f64),

    /// Resize would shrink the rectangle below one pixel
    #[error("Resize collapses the crop rectangle below one pixel")]
    Collapsed,
}

/// Out-of-range adjustment values, rejected before any pixel work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside the declared range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },
}

/// Decode and render errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Format is not one of JPEG, PNG, WebP, BMP, TIFF
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Render superseded by a newer request
    #[error("Render cancelled")]
    RenderCancelled,

    /// Resampling failed (zero target, degenerate source)
    #[error("Resample failed: {0}")]
    Resample(String),
}

impl PipelineError {
    /// Timeouts and superseded renders can be retried; bad input cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Timeout { .. } | PipelineError::RenderCancelled
        )
    }
}

/// Errors raised by `ImageSession` commands.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Command requires a loaded image
    #[error("No image loaded")]
    NoImage,

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Pipeline(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Variant export errors. A failed batch leaves no variant files behind.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Session has nothing to export
    #[error("No image loaded")]
    NoImage,

    /// Rendering a variant failed
    #[error("Rendering variant {variant} failed: {source}")]
    Render {
        variant: String,
        #[source]
        source: Box<RatiocutError>,
    },

    /// WebP encoding failed
    #[error("Encoding variant {variant} failed: {message}")]
    Encode { variant: String, message: String },

    /// Writing or renaming the output file failed
    #[error("Writing variant {variant} to {path} failed: {source}")]
    WriteFailure {
        variant: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cancelled before the batch started a variant
    #[error("Export cancelled")]
    Cancelled,
}

impl ExportError {
    /// Name of the variant that failed, if the failure is variant-specific.
    pub fn variant(&self) -> Option<&str> {
        match self {
            ExportError::Render { variant, .. }
            | ExportError::Encode { variant, .. }
            | ExportError::WriteFailure { variant, .. } => Some(variant),
            ExportError::NoImage | ExportError::Cancelled => None,
        }
    }

    /// Disk-level conditions are retryable; encode and input failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExportError::WriteFailure { source, .. } => is_retryable_io(source),
            ExportError::Cancelled => true,
            ExportError::NoImage | ExportError::Render { .. } | ExportError::Encode { .. } => false,
        }
    }
}

/// Thumbnail cache errors. Callers degrade these to "no thumbnail".
#[derive(Error, Debug)]
pub enum CacheError {
    /// Generating the downsized preview failed
    #[error("Thumbnail generation failed for {path}: {message}")]
    GenerationFailure { path: PathBuf, message: String },

    /// Reading or writing the cache directory failed
    #[error("Cache IO error: {0}")]
    Io(#[from] io::Error),
}

impl CacheError {
    pub fn is_retryable(&self) -> bool {
        match self {
            CacheError::Io(e) => is_retryable_io(e),
            CacheError::GenerationFailure { .. } => false,
        }
    }
}

/// Classify an I/O error as transient.
///
/// Full disks, busy resources, interruptions and timeouts may clear up;
/// missing directories and permission problems will not.
pub fn is_retryable_io(error: &io::Error) -> bool {
    use io::ErrorKind;
    matches!(
        error.kind(),
        ErrorKind::Interrupted
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::StorageFull
            | ErrorKind::ResourceBusy
    )
}

/// Convenience type alias for ratiocut results.
pub type Result<T> = std::result::Result<T, RatiocutError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_full_is_retryable() {
        let err = ExportError::WriteFailure {
            variant: "max".to_string(),
            path: PathBuf::from("/tmp/__x.webp"),
            source: io::Error::from(io::ErrorKind::StorageFull),
        };
        assert!(err.is_retryable());
        assert_eq!(err.variant(), Some("max"));
    }

    #[test]
    fn test_permission_denied_not_retryable() {
        let err = ExportError::WriteFailure {
            variant: "960".to_string(),
            path: PathBuf::from("/root/_x.webp"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unsupported_format_not_retryable() {
        let err: RatiocutError = PipelineError::UnsupportedFormat {
            path: PathBuf::from("a.gif"),
            format: "gif".to_string(),
        }
        .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_error_message_names_field() {
        let err = ValidationError::OutOfRange {
            field: "brightness",
            value: 3.5,
            min: 0.2,
            max: 3.0,
        };
        assert!(err.to_string().contains("brightness"));
        assert!(!RatiocutError::from(err).is_retryable());
    }
}
