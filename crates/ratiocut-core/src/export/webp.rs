//! Lossy WebP encoding with an embedded XMP metadata chunk.
//!
//! libwebp produces a simple-format file (`RIFF/WEBP/VP8 `). To carry
//! metadata it is rewritten to the extended format: a `VP8X` header with the
//! XMP flag set, the original image chunk, then an `XMP ` chunk.

use crate::metadata::MetadataMap;
use crate::types::RasterImage;

const VP8X_FLAG_XMP: u8 = 0x04;

/// Encode `raster` with libwebp at the given quality (0-100) and method (0-6).
pub fn encode(raster: &RasterImage, quality: u8, method: u8) -> Result<Vec<u8>, String> {
    let mut config =
        webp::WebPConfig::new().map_err(|_| "failed to initialize WebP config".to_string())?;
    config.quality = quality as f32;
    config.method = method as i32;

    let encoder = webp::Encoder::from_rgb(raster.as_bytes(), raster.width(), raster.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| format!("libwebp error: {e:?}"))?;
    Ok(memory.to_vec())
}

/// Encode and embed `metadata` as XMP. An empty map embeds nothing.
pub fn encode_with_metadata(
    raster: &RasterImage,
    quality: u8,
    method: u8,
    metadata: &MetadataMap,
) -> Result<Vec<u8>, String> {
    let encoded = encode(raster, quality, method)?;
    if metadata.is_empty() {
        return Ok(encoded);
    }
    embed_xmp(&encoded, raster.width(), raster.height(), metadata.to_xmp().as_bytes())
}

/// Rewrite a WebP file so it carries `xmp`.
pub fn embed_xmp(webp: &[u8], width: u32, height: u32, xmp: &[u8]) -> Result<Vec<u8>, String> {
    let chunks = parse_chunks(webp)?;
    let mut body: Vec<u8> = b"WEBP".to_vec();

    match chunks.first() {
        Some((fourcc, payload)) if fourcc == b"VP8X" => {
            let mut header = payload.to_vec();
            if let Some(flags) = header.first_mut() {
                *flags |= VP8X_FLAG_XMP;
            }
            write_chunk(&mut body, b"VP8X", &header);
            for (fourcc, payload) in chunks.iter().skip(1).filter(|(f, _)| f != b"XMP ") {
                write_chunk(&mut body, fourcc, payload);
            }
        }
        Some(_) => {
            write_chunk(&mut body, b"VP8X", &vp8x_header(VP8X_FLAG_XMP, width, height));
            for (fourcc, payload) in &chunks {
                write_chunk(&mut body, fourcc, payload);
            }
        }
        None => return Err("WebP stream has no chunks".to_string()),
    }
    write_chunk(&mut body, b"XMP ", xmp);

    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Read back the metadata embedded by [`encode_with_metadata`].
pub fn extract_xmp_entries(webp: &[u8]) -> MetadataMap {
    parse_chunks(webp)
        .ok()
        .and_then(|chunks| {
            chunks
                .into_iter()
                .find(|(fourcc, _)| fourcc == b"XMP ")
                .map(|(_, payload)| MetadataMap::from_xmp(&String::from_utf8_lossy(payload)))
        })
        .unwrap_or_default()
}

fn vp8x_header(flags: u8, width: u32, height: u32) -> [u8; 10] {
    let w = width.saturating_sub(1).to_le_bytes();
    let h = height.saturating_sub(1).to_le_bytes();
    [flags, 0, 0, 0, w[0], w[1], w[2], h[0], h[1], h[2]]
}

fn write_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

type Chunk<'a> = ([u8; 4], &'a [u8]);

fn parse_chunks(webp: &[u8]) -> Result<Vec<Chunk<'_>>, String> {
    if webp.len() < 12 || &webp[0..4] != b"RIFF" || &webp[8..12] != b"WEBP" {
        return Err("not a RIFF/WEBP stream".to_string());
    }
    let mut chunks = Vec::new();
    let mut pos = 12;
    while pos + 8 <= webp.len() {
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(&webp[pos..pos + 4]);
        let mut size = [0u8; 4];
        size.copy_from_slice(&webp[pos + 4..pos + 8]);
        let size = u32::from_le_bytes(size) as usize;
        let start = pos + 8;
        let end = start
            .checked_add(size)
            .filter(|&end| end <= webp.len())
            .ok_or_else(|| format!("truncated chunk {}", String::from_utf8_lossy(&fourcc)))?;
        chunks.push((fourcc, &webp[start..end]));
        pos = end + size % 2;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn sample() -> RasterImage {
        RasterImage::new(image::RgbImage::from_fn(33, 17, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 13) as u8, 90])
        }))
    }

    #[test]
    fn test_encode_produces_decodable_webp() {
        let bytes = encode(&sample(), 95, 6).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (33, 17));
    }

    #[test]
    fn test_metadata_embedded_as_extended_webp() {
        let metadata = MetadataMap::parse_text("Title=Dunes\nArtist=P. Holke");
        let bytes = encode_with_metadata(&sample(), 95, 4, &metadata).unwrap();

        assert_eq!(&bytes[12..16], b"VP8X");
        assert_eq!(bytes[20] & VP8X_FLAG_XMP, VP8X_FLAG_XMP);
        let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        assert_eq!(riff_size + 8, bytes.len());

        assert_eq!(extract_xmp_entries(&bytes), metadata);
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (33, 17));
    }

    #[test]
    fn test_canvas_size_is_stored_minus_one() {
        let header = vp8x_header(VP8X_FLAG_XMP, 3840, 2160);
        assert_eq!(&header[4..7], &[0xFF, 0x0E, 0x00]);
        assert_eq!(&header[7..10], &[0x6F, 0x08, 0x00]);
    }

    #[test]
    fn test_garbage_has_no_entries() {
        assert!(extract_xmp_entries(b"not a webp").is_empty());
    }
}
