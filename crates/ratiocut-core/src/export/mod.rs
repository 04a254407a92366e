//! Multi-resolution WebP export.
//!
//! An export runs in two phases. Every variant is first rendered, encoded
//! and written to a temporary sibling file. Only when all of them are on disk
//! are they renamed into place, each existing target being moved aside first.
//! A failure in either phase leaves the directory as it was before the batch:
//! temporary files are removed and replaced targets are restored.

mod variants;
mod webp;

pub use variants::{select_variants, AspectClass, ExportVariant};
pub use webp::{encode, encode_with_metadata, extract_xmp_entries};

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

use crate::config::{Config, ExportConfig, ProcessingConfig};
use crate::error::ExportError;
use crate::metadata::MetadataMap;
use crate::pipeline::{CancelFlag, ProcessingPipeline};
use crate::session::{ImageSession, SessionSnapshot};

/// A file produced by an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// File size in bytes
    pub bytes: u64,
    /// Variant label ("max", "960", "4k", ...)
    pub label: String,
}

/// Renders, encodes and writes export variants.
#[derive(Debug, Clone)]
pub struct ExportService {
    pipeline: ProcessingPipeline,
    export: ExportConfig,
    processing: ProcessingConfig,
}

/// A running background export.
pub struct ExportJob {
    handle: tokio::task::JoinHandle<Result<Vec<WrittenFile>, ExportError>>,
    cancel: CancelFlag,
}

impl ExportJob {
    /// Stop before the next variant starts. A variant already being written finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Flag that cancels this job, usable after [`ExportJob::wait`] took ownership.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the batch to finish.
    pub async fn wait(self) -> Result<Vec<WrittenFile>, ExportError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ExportError::Cancelled),
            Err(e) => Err(ExportError::Encode {
                variant: "batch".to_string(),
                message: format!("export task failed: {e}"),
            }),
        }
    }
}

impl ExportService {
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: ProcessingPipeline::new(config),
            export: config.export.clone(),
            processing: config.processing.clone(),
        }
    }

    /// Export the session's committed entry next to `base_path`.
    ///
    /// File names derive from `base_path`'s stem; see [`select_variants`].
    pub fn export_variants(
        &self,
        session: &ImageSession,
        base_path: &Path,
        metadata: &MetadataMap,
    ) -> Result<Vec<WrittenFile>, ExportError> {
        let snapshot = session.snapshot().ok_or(ExportError::NoImage)?;
        self.export_snapshot(&snapshot, base_path, metadata, &CancelFlag::new())
    }

    /// Run [`ExportService::export_snapshot`] on tokio's blocking pool.
    pub fn spawn_export(
        &self,
        snapshot: SessionSnapshot,
        base_path: PathBuf,
        metadata: MetadataMap,
    ) -> ExportJob {
        let cancel = CancelFlag::new();
        let service = self.clone();
        let job_cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            service.export_snapshot(&snapshot, &base_path, &metadata, &job_cancel)
        });
        ExportJob { handle, cancel }
    }

    /// Export a committed snapshot. Checks `cancel` before each variant.
    pub fn export_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        base_path: &Path,
        metadata: &MetadataMap,
        cancel: &CancelFlag,
    ) -> Result<Vec<WrittenFile>, ExportError> {
        let start = Instant::now();
        let dir = base_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let stem = base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("export");
        let crop = snapshot.entry.crop;
        let variants = select_variants(&crop, &self.export, &self.processing);

        tracing::info!(
            "Exporting {} variants of {:?} ({:?})",
            variants.len(),
            stem,
            AspectClass::of(&crop)
        );

        let mut staged: Vec<Staged> = Vec::with_capacity(variants.len());
        for variant in &variants {
            if cancel.is_cancelled() {
                tracing::warn!("Export cancelled before variant {}", variant.label);
                return Err(ExportError::Cancelled);
            }
            let path = dir.join(variant.file_name(stem));
            match self.stage_variant(snapshot, variant, &path, metadata) {
                Ok(entry) => staged.push(entry),
                Err(e) => {
                    tracing::warn!("Export aborted at variant {}: {}", variant.label, e);
                    return Err(e);
                }
            }
        }

        let written = commit(staged).inspect_err(|e| {
            tracing::warn!("Export aborted while committing: {}", e);
        })?;

        tracing::info!(
            "Exported {} files in {:?}",
            written.len(),
            start.elapsed()
        );
        Ok(written)
    }

    /// Render, encode and write one variant to a temp file next to `path`.
    fn stage_variant(
        &self,
        snapshot: &SessionSnapshot,
        variant: &ExportVariant,
        path: &Path,
        metadata: &MetadataMap,
    ) -> Result<Staged, ExportError> {
        let render_start = Instant::now();
        let raster = self
            .pipeline
            .render(
                &snapshot.original,
                &snapshot.entry.crop,
                variant.target_width,
                &snapshot.entry.adjustments,
            )
            .map_err(|e| ExportError::Render {
                variant: variant.label.clone(),
                source: Box::new(e),
            })?;
        tracing::trace!("  Render {}: {:?}", variant.label, render_start.elapsed());

        let encode_start = Instant::now();
        let bytes =
            encode_with_metadata(&raster, self.export.quality, self.export.effort, metadata)
                .map_err(|message| ExportError::Encode {
                    variant: variant.label.clone(),
                    message,
                })?;
        tracing::trace!("  Encode {}: {:?}", variant.label, encode_start.elapsed());

        let tmp = write_temp(path, &bytes).map_err(|source| ExportError::WriteFailure {
            variant: variant.label.clone(),
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            "Staged {:?} ({}x{}, {} bytes)",
            path,
            raster.width(),
            raster.height(),
            bytes.len()
        );

        Ok(Staged {
            file: WrittenFile {
                path: path.to_path_buf(),
                width: raster.width(),
                height: raster.height(),
                bytes: bytes.len() as u64,
                label: variant.label.clone(),
            },
            tmp,
        })
    }
}

/// A fully written variant waiting to be renamed onto its target.
struct Staged {
    file: WrittenFile,
    tmp: NamedTempFile,
}

/// A target that now holds new contents, with the file it replaced.
struct Committed {
    path: PathBuf,
    backup: Option<NamedTempFile>,
}

/// Rename every staged file into place, or restore all targets on failure.
///
/// Staged files not yet renamed are deleted when dropped. Backups of
/// replaced targets are deleted once the whole batch is in place.
fn commit(staged: Vec<Staged>) -> Result<Vec<WrittenFile>, ExportError> {
    let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
    let mut written = Vec::with_capacity(staged.len());

    for Staged { file, tmp } in staged {
        match replace(&file.path, tmp) {
            Ok(backup) => {
                committed.push(Committed {
                    path: file.path.clone(),
                    backup,
                });
                written.push(file);
            }
            Err(source) => {
                restore(committed);
                return Err(ExportError::WriteFailure {
                    variant: file.label,
                    path: file.path,
                    source,
                });
            }
        }
    }
    Ok(written)
}

/// Move an existing regular file at `path` aside, then rename `tmp` onto it.
///
/// Returns the moved-aside file. When the rename fails it is moved back.
fn replace(path: &Path, tmp: NamedTempFile) -> std::io::Result<Option<NamedTempFile>> {
    let backup = if fs::symlink_metadata(path).is_ok_and(|m| m.is_file()) {
        let backup = temp_sibling(path, ".bak")?;
        fs::rename(path, backup.path())?;
        Some(backup)
    } else {
        None
    };

    match tmp.persist(path) {
        Ok(_) => Ok(backup),
        Err(e) => {
            if let Some(backup) = backup {
                if let Err(err) = backup.persist(path) {
                    tracing::warn!("Failed to restore {:?}: {}", path, err.error);
                }
            }
            Err(e.error)
        }
    }
}

fn restore(committed: Vec<Committed>) {
    for Committed { path, backup } in committed.into_iter().rev() {
        let result = match backup {
            Some(backup) => backup.persist(&path).map(|_| ()).map_err(|e| e.error),
            None => fs::remove_file(&path),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to roll back {:?}: {}", path, e);
        }
    }
}

/// Hidden, uniquely named file next to `path`; deleted on drop unless persisted.
fn temp_sibling(path: &Path, suffix: &str) -> std::io::Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(suffix)
        .tempfile_in(dir)
}

fn write_temp(path: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut tmp = temp_sibling(path, ".tmp")?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Write to a hidden sibling temp file, then rename over `path`.
///
/// A crash leaves at most the temp file behind, never a truncated target.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    write_temp(path, bytes)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::AdjustmentState;
    use crate::geometry::AspectRatio;
    use crate::types::RasterImage;
    use image::{Rgb, RgbImage};

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.export.effort = 0;
        config
    }

    fn loaded_session(config: &Config, width: u32, height: u32) -> ImageSession {
        let mut session = ImageSession::new(config);
        session.load(RasterImage::new(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x / 16 % 256) as u8, (y / 16 % 256) as u8, 128])
        })));
        session
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_16_9_export_writes_video_sizes() {
        let config = fast_config();
        let mut session = loaded_session(&config, 4000, 2250);
        session.apply_ratio(Some(AspectRatio::LANDSCAPE_16_9)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = ExportService::new(&config)
            .export_variants(&session, &dir.path().join("dunes.jpg"), &MetadataMap::new())
            .unwrap();

        assert_eq!(
            file_names(dir.path()),
            [
                "__dunes_4k_16x9.webp",
                "_dunes_1080p_16x9.webp",
                "dunes_720p_16x9.webp"
            ]
        );
        for (file, width) in files.iter().zip([3840, 1920, 1280]) {
            let decoded = image::open(&file.path).unwrap();
            assert_eq!(decoded.width(), width);
            assert_eq!(file.width, width);
            assert_eq!(file.bytes, fs::metadata(&file.path).unwrap().len());
        }
    }

    #[test]
    fn test_square_export_uses_prefix_scheme() {
        let config = fast_config();
        let mut session = loaded_session(&config, 1200, 800);
        session.apply_ratio(Some(AspectRatio::SQUARE)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = ExportService::new(&config)
            .export_variants(&session, &dir.path().join("name.png"), &MetadataMap::new())
            .unwrap();

        assert_eq!(
            file_names(dir.path()),
            ["__name.webp", "_name.webp", "name.webp"]
        );
        let dims: Vec<_> = files.iter().map(|f| (f.width, f.height)).collect();
        assert_eq!(dims, [(800, 800), (960, 960), (480, 480)]);
    }

    #[test]
    fn test_metadata_in_every_variant() {
        let config = fast_config();
        let session = loaded_session(&config, 640, 480);
        let dir = tempfile::tempdir().unwrap();
        let metadata = MetadataMap::parse_text("Title=Harbor\nCopyright=2024 P. Holke");

        let files = ExportService::new(&config)
            .export_variants(&session, &dir.path().join("harbor.tif"), &metadata)
            .unwrap();
        assert_eq!(files.len(), 3);
        for file in &files {
            let bytes = fs::read(&file.path).unwrap();
            assert_eq!(extract_xmp_entries(&bytes), metadata);
        }
    }

    #[test]
    fn test_export_reflects_committed_adjustments() {
        let config = fast_config();
        let plain = loaded_session(&config, 320, 180);
        let mut bright = loaded_session(&config, 320, 180);
        bright
            .apply_adjustment(AdjustmentState {
                brightness: 1.2,
                contrast: 1.1,
                ..AdjustmentState::NEUTRAL
            })
            .unwrap();

        let service = ExportService::new(&config);
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let plain_files = service
            .export_variants(&plain, &a.path().join("x.jpg"), &MetadataMap::new())
            .unwrap();
        let bright_files = service
            .export_variants(&bright, &b.path().join("x.jpg"), &MetadataMap::new())
            .unwrap();
        let p = fs::read(&plain_files[2].path).unwrap();
        let q = fs::read(&bright_files[2].path).unwrap();
        assert_ne!(p, q);
    }

    #[test]
    fn test_failed_reexport_restores_previous_set() {
        let config = fast_config();
        let mut session = loaded_session(&config, 1200, 800);
        session.apply_ratio(Some(AspectRatio::SQUARE)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("name.png");
        let service = ExportService::new(&config);
        service
            .export_variants(&session, &base, &MetadataMap::new())
            .unwrap();
        let previous: Vec<Vec<u8>> = ["__name.webp", "_name.webp"]
            .iter()
            .map(|n| fs::read(dir.path().join(n)).unwrap())
            .collect();

        // The smallest variant's target can no longer be replaced.
        fs::remove_file(dir.path().join("name.webp")).unwrap();
        fs::create_dir(dir.path().join("name.webp")).unwrap();
        session
            .apply_adjustment(AdjustmentState {
                brightness: 1.4,
                ..AdjustmentState::NEUTRAL
            })
            .unwrap();

        let err = service
            .export_variants(&session, &base, &MetadataMap::new())
            .unwrap_err();
        assert_eq!(err.variant(), Some("480"));
        assert_eq!(
            file_names(dir.path()),
            ["__name.webp", "_name.webp", "name.webp"]
        );
        for (name, bytes) in ["__name.webp", "_name.webp"].iter().zip(&previous) {
            assert_eq!(&fs::read(dir.path().join(name)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_failure_rolls_back_written_variants() {
        let config = fast_config();
        let mut session = loaded_session(&config, 1200, 800);
        session.apply_ratio(Some(AspectRatio::SQUARE)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        // A directory where the third file should go makes its rename fail.
        fs::create_dir(dir.path().join("name.webp")).unwrap();

        let err = ExportService::new(&config)
            .export_variants(&session, &dir.path().join("name.png"), &MetadataMap::new())
            .unwrap_err();

        match &err {
            ExportError::WriteFailure { variant, .. } => assert_eq!(variant, "480"),
            other => panic!("expected WriteFailure, got {other:?}"),
        }
        assert_eq!(err.variant(), Some("480"));
        assert_eq!(file_names(dir.path()), ["name.webp"]);
    }

    #[test]
    fn test_export_without_image() {
        let config = fast_config();
        let session = ImageSession::new(&config);
        let err = ExportService::new(&config)
            .export_variants(&session, Path::new("/tmp/x.png"), &MetadataMap::new())
            .unwrap_err();
        assert!(matches!(err, ExportError::NoImage));
    }

    #[tokio::test]
    async fn test_cancelled_job_writes_nothing() {
        let config = fast_config();
        let session = loaded_session(&config, 400, 300);
        let dir = tempfile::tempdir().unwrap();
        let service = ExportService::new(&config);
        let snapshot = session.snapshot().unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = service
            .export_snapshot(&snapshot, &dir.path().join("a.png"), &MetadataMap::new(), &cancel)
            .unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
        assert!(file_names(dir.path()).is_empty());

        let job = service.spawn_export(snapshot, dir.path().join("a.png"), MetadataMap::new());
        let files = job.wait().await.unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_temp_files_are_unique_per_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webp");
        let a = write_temp(&path, b"first").unwrap();
        let b = write_temp(&path, b"second").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(dir.path()));

        drop(a);
        drop(b);
        assert!(file_names(dir.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webp");
        fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"new contents").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(file_names(dir.path()), ["out.webp"]);
    }
}
