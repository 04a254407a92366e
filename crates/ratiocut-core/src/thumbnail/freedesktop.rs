//! Thumbnail files in the freedesktop.org format.
//!
//! A thumbnail is an 8-bit RGB PNG named `md5(uri).png` whose `tEXt` chunks
//! record the source URI, modification time and size. Readers must reject a
//! file whose chunks no longer describe the source.

use std::io::Cursor;
use std::path::Path;

use super::key::SourceStamp;
use crate::types::RasterImage;

const URI: &str = "Thumb::URI";
const MTIME: &str = "Thumb::MTime";
const SIZE: &str = "Thumb::Size";
const SOFTWARE: &str = "Software";

/// Encode `raster` as a thumbnail PNG for `stamp`.
pub(crate) fn encode(
    raster: &RasterImage,
    stamp: &SourceStamp,
) -> Result<Vec<u8>, png::EncodingError> {
    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, raster.width(), raster.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk(URI.to_string(), stamp.uri.clone())?;
    encoder.add_text_chunk(MTIME.to_string(), stamp.mtime.to_string())?;
    encoder.add_text_chunk(SIZE.to_string(), stamp.size.to_string())?;
    encoder.add_text_chunk(SOFTWARE.to_string(), format!("ratiocut {}", crate::VERSION))?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(raster.as_rgb().as_raw())?;
    writer.finish()?;
    Ok(bytes)
}

/// Decode a thumbnail PNG, or `None` when it is unreadable or stale for `stamp`.
///
/// `Thumb::URI` and `Thumb::MTime` must be present and match. `Thumb::Size`
/// is optional but must match when present.
pub(crate) fn decode(bytes: &[u8], stamp: &SourceStamp, file: &Path) -> Option<RasterImage> {
    let reader = match png::Decoder::new(Cursor::new(bytes)).read_info() {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!("Ignoring unreadable thumbnail {:?}: {}", file, e);
            return None;
        }
    };

    let text = &reader.info().uncompressed_latin1_text;
    let field = |keyword: &str| {
        text.iter()
            .find(|chunk| chunk.keyword == keyword)
            .map(|chunk| chunk.text.as_str())
    };
    let mtime = stamp.mtime.to_string();
    let size = stamp.size.to_string();
    let fresh = field(URI) == Some(stamp.uri.as_str())
        && field(MTIME) == Some(mtime.as_str())
        && field(SIZE).is_none_or(|s| s == size);
    if !fresh {
        tracing::debug!("Thumbnail {:?} is stale for {}", file, stamp.uri);
        return None;
    }

    match image::load_from_memory_with_format(bytes, image::ImageFormat::Png) {
        Ok(img) => Some(RasterImage::from(img)),
        Err(e) => {
            tracing::debug!("Ignoring unreadable thumbnail {:?}: {}", file, e);
            None
        }
    }
}
