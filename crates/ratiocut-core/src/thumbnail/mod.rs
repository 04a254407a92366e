//! Content-keyed thumbnail cache.
//!
//! Entries live in two layers: a bounded in-memory map for repeated hits
//! within a process and PNG files in the freedesktop thumbnail directory
//! shared with other tools. Entries are immutable once written. Generation
//! for one key is single-flight: concurrent requests wait on the first one's
//! result. Disk reads, decodes and writes on the async paths run on tokio's
//! blocking pool.

mod freedesktop;
mod key;

pub use key::{file_uri, ThumbnailKey};

use image::imageops::{self, FilterType};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::error::CacheError;
use crate::export::write_atomic;
use crate::pipeline::ImageDecoder;
use crate::types::RasterImage;
use key::SourceStamp;

/// A cached downsized preview.
#[derive(Debug, Clone)]
pub struct ThumbnailEntry {
    pub raster: RasterImage,
    pub created: SystemTime,
}

type InFlight = Arc<OnceCell<ThumbnailEntry>>;

/// Least-recently-used map of at most `capacity` entries.
#[derive(Debug)]
struct MemoryLayer {
    entries: HashMap<ThumbnailKey, (ThumbnailEntry, u64)>,
    capacity: usize,
    tick: u64,
}

impl MemoryLayer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
            tick: 0,
        }
    }

    fn get(&mut self, key: &ThumbnailKey) -> Option<ThumbnailEntry> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|(entry, used)| {
            *used = tick;
            entry.clone()
        })
    }

    fn insert(&mut self, key: ThumbnailKey, entry: ThumbnailEntry) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.tick += 1;
        self.entries.insert(key, (entry, self.tick));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct ThumbnailCache {
    dir: PathBuf,
    edge: u32,
    decoder: ImageDecoder,
    memory: Mutex<MemoryLayer>,
    in_flight: Mutex<HashMap<ThumbnailKey, InFlight>>,
}

impl ThumbnailCache {
    /// Cache in the configured thumbnail directory.
    pub fn new(config: &Config) -> Self {
        Self::with_dir(config, config.thumbnail_dir())
    }

    /// Cache rooted at `dir`, otherwise configured from `config`.
    pub fn with_dir(config: &Config, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            edge: config.thumbnail.size,
            decoder: ImageDecoder::new(config.limits.clone()),
            memory: Mutex::new(MemoryLayer::new(config.thumbnail.memory_entries)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the thumbnail file for `path` in the cache directory.
    pub fn file_for(&self, path: &Path) -> PathBuf {
        self.dir.join(SourceStamp::new(path, 0, SystemTime::UNIX_EPOCH).file_name())
    }

    /// Cached thumbnail for the file state `(path, file_size, mtime)`.
    ///
    /// Blocks on disk I/O when the memory layer misses.
    pub fn get(&self, path: &Path, file_size: u64, mtime: SystemTime) -> Option<RasterImage> {
        let key = ThumbnailKey::new(path, file_size, mtime);
        if let Some(hit) = lock(&self.memory).get(&key) {
            return Some(hit.raster);
        }
        let entry = read_disk(&self.dir, &SourceStamp::new(path, file_size, mtime))?;
        lock(&self.memory).insert(key, entry.clone());
        Some(entry.raster)
    }

    /// Store `raster` for the file state. Memory is updated even when the disk write fails.
    pub fn put(
        &self,
        path: &Path,
        file_size: u64,
        mtime: SystemTime,
        raster: RasterImage,
    ) -> Result<(), CacheError> {
        let key = ThumbnailKey::new(path, file_size, mtime);
        let stamp = SourceStamp::new(path, file_size, mtime);
        let entry = ThumbnailEntry {
            raster,
            created: SystemTime::now(),
        };
        lock(&self.memory).insert(key, entry.clone());
        write_disk(&self.dir, &stamp, &entry.raster)
    }

    /// Cached thumbnail, or the result of `generate` stored under the key.
    ///
    /// Concurrent callers for the same key share one `generate` call.
    pub async fn get_or_generate<F, Fut>(
        &self,
        path: &Path,
        file_size: u64,
        mtime: SystemTime,
        generate: F,
    ) -> Result<RasterImage, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RasterImage, CacheError>>,
    {
        let key = ThumbnailKey::new(path, file_size, mtime);
        let hit = lock(&self.memory).get(&key);
        if let Some(hit) = hit {
            return Ok(hit.raster);
        }

        let cell: InFlight = lock(&self.in_flight).entry(key.clone()).or_default().clone();
        let result = cell
            .get_or_try_init(|| async {
                // A previous flight may have finished between the miss and the lock.
                let hit = lock(&self.memory).get(&key);
                if let Some(hit) = hit {
                    return Ok(hit);
                }
                let stamp = SourceStamp::new(path, file_size, mtime);
                if let Some(hit) = self.load(&stamp).await {
                    lock(&self.memory).insert(key.clone(), hit.clone());
                    return Ok(hit);
                }

                tracing::debug!("Generating thumbnail for {:?}", path);
                let entry = ThumbnailEntry {
                    raster: generate().await?,
                    created: SystemTime::now(),
                };
                lock(&self.memory).insert(key.clone(), entry.clone());
                self.save(stamp, entry.raster.clone()).await;
                Ok(entry)
            })
            .await
            .cloned();

        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(&key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
            in_flight.remove(&key);
        }
        result.map(|e| e.raster)
    }

    /// Thumbnail for the file at `path`, decoding it on a miss.
    ///
    /// Failures degrade to `None`.
    pub async fn thumbnail_for(&self, path: &Path) -> Option<RasterImage> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Cannot stat {:?} for thumbnail: {}", path, e);
                return None;
            }
        };
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let result = self
            .get_or_generate(path, metadata.len(), mtime, || self.generate(path))
            .await;
        match result {
            Ok(raster) => Some(raster),
            Err(e) => {
                tracing::warn!("No thumbnail for {:?}: {}", path, e);
                None
            }
        }
    }

    async fn generate(&self, path: &Path) -> Result<RasterImage, CacheError> {
        let decoded = self
            .decoder
            .decode(path)
            .await
            .map_err(|e| CacheError::GenerationFailure {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let edge = self.edge;
        tokio::task::spawn_blocking(move || downsize(&decoded.raster, edge))
            .await
            .map_err(|e| CacheError::GenerationFailure {
                path: path.to_path_buf(),
                message: format!("Task join error: {e}"),
            })
    }

    async fn load(&self, stamp: &SourceStamp) -> Option<ThumbnailEntry> {
        let dir = self.dir.clone();
        let stamp = stamp.clone();
        match tokio::task::spawn_blocking(move || read_disk(&dir, &stamp)).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Thumbnail read task failed: {}", e);
                None
            }
        }
    }

    async fn save(&self, stamp: SourceStamp, raster: RasterImage) {
        let dir = self.dir.clone();
        let uri = stamp.uri.clone();
        let result = tokio::task::spawn_blocking(move || write_disk(&dir, &stamp, &raster)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to persist thumbnail for {}: {}", uri, e),
            Err(e) => tracing::warn!("Thumbnail write task failed: {}", e),
        }
    }

    #[cfg(test)]
    fn memory_len(&self) -> usize {
        lock(&self.memory).len()
    }
}

/// Thumbnail file for `stamp` in `dir`, if present and still describing the source.
fn read_disk(dir: &Path, stamp: &SourceStamp) -> Option<ThumbnailEntry> {
    let file = dir.join(stamp.file_name());
    let created = std::fs::metadata(&file).and_then(|m| m.modified()).ok()?;
    let bytes = match std::fs::read(&file) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Cannot read thumbnail {:?}: {}", file, e);
            return None;
        }
    };
    let raster = freedesktop::decode(&bytes, stamp, &file)?;
    Some(ThumbnailEntry { raster, created })
}

fn write_disk(dir: &Path, stamp: &SourceStamp, raster: &RasterImage) -> Result<(), CacheError> {
    let file = dir.join(stamp.file_name());
    std::fs::create_dir_all(dir)?;
    let png = freedesktop::encode(raster, stamp).map_err(|e| CacheError::GenerationFailure {
        path: file.clone(),
        message: e.to_string(),
    })?;
    write_atomic(&file, &png)?;
    Ok(())
}

/// Scale so the longest edge is at most `edge`. Smaller images are kept as-is.
pub fn downsize(raster: &RasterImage, edge: u32) -> RasterImage {
    let (width, height) = (raster.width(), raster.height());
    if width.max(height) <= edge {
        return raster.clone();
    }
    let (w, h) = if width >= height {
        (edge, scale_edge(height, width, edge))
    } else {
        (scale_edge(width, height, edge), edge)
    };
    RasterImage::new(imageops::resize(raster.as_rgb(), w, h, FilterType::Lanczos3))
}

fn scale_edge(short: u32, long: u32, edge: u32) -> u32 {
    ((short as f64 * edge as f64 / long as f64).round() as u32).max(1)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
