//! EXIF fields used to pre-fill the editable export metadata.

use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::metadata::MetadataMap;

/// EXIF tags copied into the metadata map, with their display keys.
const CARRIED_TAGS: [(Tag, &str); 5] = [
    (Tag::Make, "Make"),
    (Tag::Model, "Model"),
    (Tag::Artist, "Artist"),
    (Tag::Copyright, "Copyright"),
    (Tag::ImageDescription, "Description"),
];

/// Read the source file's EXIF into a metadata map.
///
/// Lenient: a file without EXIF, or one that fails to parse, yields an empty
/// map. Empty string fields are skipped.
pub fn read_source_metadata(path: &Path) -> MetadataMap {
    let mut map = MetadataMap::new();
    let Some(exif) = read_exif(path) else {
        return map;
    };

    if let Some(date) = get_datetime(&exif) {
        map.insert("DateTime", date);
    }
    for (tag, key) in CARRIED_TAGS {
        if let Some(value) = get_string(&exif, tag) {
            map.insert(key, value);
        }
    }
    map
}

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    Reader::new().read_from_container(&mut reader).ok()
}

/// Get a string field, with quotes and padding removed.
fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let s = field.display_value().to_string();
    let s = s.trim_matches('"').trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Capture datetime, preferring DateTimeOriginal over DateTime.
fn get_datetime(exif: &exif::Exif) -> Option<String> {
    get_string(exif, Tag::DateTimeOriginal).or_else(|| get_string(exif, Tag::DateTime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_empty_map() {
        assert!(read_source_metadata(Path::new("/nonexistent/file.jpg")).is_empty());
    }

    #[test]
    fn test_png_without_exif_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        image::RgbImage::new(3, 3).save(&path).unwrap();
        assert!(read_source_metadata(&path).is_empty());
    }
}
