//! Image processing pipeline components.
//!
//! - **validate**: Pre-decode checks (existence, size, magic bytes)
//! - **decode**: Load and decode images into RGB rasters
//! - **metadata**: Pre-fill export metadata from EXIF
//! - **render**: Crop, resample, sharpen and adjust

pub mod decode;
pub mod metadata;
pub mod render;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use metadata::read_source_metadata;
pub use render::{scaled_height, CancelFlag, ProcessingPipeline};
pub use validate::{sniff_format, Validator, ACCEPTED_FORMATS};
