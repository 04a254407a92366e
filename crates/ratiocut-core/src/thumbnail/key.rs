//! Cache keys for thumbnails.
//!
//! Two identities exist for one source file. [`ThumbnailKey`] covers the
//! full file state and keys the in-memory layer and in-flight generation.
//! `SourceStamp` follows the freedesktop thumbnail convention so other
//! desktop tools can find and validate the files on disk.

use blake3::Hasher;
use md5::{Digest, Md5};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// BLAKE3 digest of (absolute path, file size, modification time).
///
/// Any change to the source file changes the key, so entries never need
/// invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey(String);

impl ThumbnailKey {
    pub fn new(path: &Path, file_size: u64, mtime: SystemTime) -> Self {
        let absolute = absolute(path);
        let since_epoch = mtime.duration_since(UNIX_EPOCH).unwrap_or_default();

        let mut hasher = Hasher::new();
        hasher.update(absolute.as_os_str().as_encoded_bytes());
        // Separator keeps path bytes from running into the size field.
        hasher.update(&[0]);
        hasher.update(&file_size.to_le_bytes());
        hasher.update(&since_epoch.as_secs().to_le_bytes());
        hasher.update(&since_epoch.subsec_nanos().to_le_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThumbnailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The values a freedesktop thumbnail records about its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceStamp {
    /// `Thumb::URI`
    pub uri: String,
    /// `Thumb::MTime`, whole seconds since the epoch
    pub mtime: u64,
    /// `Thumb::Size`
    pub size: u64,
}

impl SourceStamp {
    pub fn new(path: &Path, file_size: u64, mtime: SystemTime) -> Self {
        Self {
            uri: file_uri(path),
            mtime: mtime
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            size: file_size,
        }
    }

    /// `md5(uri)` in hex plus `.png`.
    pub fn file_name(&self) -> String {
        let digest = Md5::digest(self.uri.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("{hex}.png")
    }
}

/// `file://` URI of the absolute path, escaped the way GLib escapes file URIs.
pub fn file_uri(path: &Path) -> String {
    let absolute = absolute(path);
    let mut uri = String::from("file://");
    for &byte in absolute.as_os_str().as_encoded_bytes() {
        if byte.is_ascii_alphanumeric() || b"!$&'()*+,-./:=@_~".contains(&byte) {
            uri.push(byte as char);
        } else {
            uri.push_str(&format!("%{byte:02X}"));
        }
    }
    uri
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_key_is_stable() {
        let a = ThumbnailKey::new(Path::new("/photos/a.jpg"), 1024, at(1_700_000_000));
        let b = ThumbnailKey::new(Path::new("/photos/a.jpg"), 1024, at(1_700_000_000));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_any_input_change_misses() {
        let base = ThumbnailKey::new(Path::new("/photos/a.jpg"), 1024, at(1_700_000_000));
        assert_ne!(
            base,
            ThumbnailKey::new(Path::new("/photos/b.jpg"), 1024, at(1_700_000_000))
        );
        assert_ne!(
            base,
            ThumbnailKey::new(Path::new("/photos/a.jpg"), 1025, at(1_700_000_000))
        );
        assert_ne!(
            base,
            ThumbnailKey::new(Path::new("/photos/a.jpg"), 1024, at(1_700_000_001))
        );
    }

    #[test]
    fn test_file_uri_escapes_reserved_bytes() {
        assert_eq!(
            file_uri(Path::new("/home/jens/photos/a.jpg")),
            "file:///home/jens/photos/a.jpg"
        );
        assert_eq!(
            file_uri(Path::new("/photos/summer 2024/#1.jpg")),
            "file:///photos/summer%202024/%231.jpg"
        );
        assert_eq!(
            file_uri(Path::new("/photos/café.jpg")),
            "file:///photos/caf%C3%A9.jpg"
        );
    }

    #[test]
    fn test_file_name_is_md5_of_uri() {
        let stamp = SourceStamp::new(Path::new("/home/jens/photos/a.jpg"), 10, at(5));
        assert_eq!(stamp.file_name(), "1b951688418f7bb03f1442c623796cec.png");
        assert_eq!((stamp.mtime, stamp.size), (5, 10));

        // The name depends only on the location, the stamp on the file state.
        let later = SourceStamp::new(Path::new("/home/jens/photos/a.jpg"), 11, at(6));
        assert_eq!(later.file_name(), stamp.file_name());
        assert_ne!(later, stamp);
    }
}
