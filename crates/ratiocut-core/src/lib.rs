//! Ratiocut Core - ratio-locked cropping, color correction and WebP variant export.
//!
//! The engine is UI-agnostic: a windowing layer drives an [`ImageSession`]
//! through explicit commands and reads rendered previews back; nothing in
//! here draws to a screen or walks directories.
//!
//! # Architecture
//!
//! ```text
//! load → ImageSession ──commit──▶ HistoryStack
//!             │
//!             └─ RenderTask ─▶ ProcessingPipeline: crop → resample + sharpen → adjust
//!
//! save → ExportService: snapshot → 3 variants → WebP + XMP → temp file → rename
//! ```
//!
//! [`ThumbnailCache`] sits beside the session and serves file browsers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ratiocut_core::{AdjustmentState, AspectRatio, Config, ExportService, ImageSession, MetadataMap};
//!
//! #[tokio::main]
//! async fn main() -> ratiocut_core::Result<()> {
//!     let config = Config::load()?;
//!     let mut session = ImageSession::new(&config);
//!     session.load_path("./dunes.jpg".as_ref()).await?;
//!     session.apply_ratio(Some(AspectRatio::LANDSCAPE_16_9))?;
//!     session.apply_adjustment(AdjustmentState { brightness: 1.2, ..AdjustmentState::NEUTRAL })?;
//!
//!     let files = ExportService::new(&config)
//!         .export_variants(&session, "./dunes.jpg".as_ref(), &MetadataMap::new())?;
//!     println!("Wrote {} files", files.len());
//!     Ok(())
//! }
//! ```

pub mod adjust;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod metadata;
pub mod pipeline;
pub mod session;
pub mod thumbnail;
pub mod types;

pub use adjust::{auto_balance, AdjustmentState, AutoBalanceMode, RgbBalance};
pub use config::Config;
pub use error::{
    CacheError, ConfigError, ExportError, GeometryError, PipelineError, PipelineResult,
    RatiocutError, Result, SessionError, ValidationError,
};
pub use export::{ExportJob, ExportService, ExportVariant, WrittenFile};
pub use geometry::{AspectRatio, CropRect, Handle, ImageSize};
pub use metadata::MetadataMap;
pub use pipeline::{read_source_metadata, CancelFlag, ImageDecoder, ProcessingPipeline};
pub use session::{HistoryEntry, HistoryStack, ImageSession, RenderTask, SessionPhase, SessionSnapshot};
pub use thumbnail::{ThumbnailCache, ThumbnailKey};
pub use types::RasterImage;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
