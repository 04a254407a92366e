//! Core data types shared by every stage of the editing engine.

use image::{DynamicImage, RgbImage};
use std::sync::Arc;

/// An immutable 8-bit RGB pixel buffer.
///
/// Cloning is cheap: the pixel data sits behind an `Arc` and is shared
/// read-only across threads. Every transform produces a new `RasterImage`;
/// nothing mutates a buffer once it is wrapped here.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbImage>,
}

impl RasterImage {
    /// Channels per pixel.
    pub const CHANNELS: u8 = 3;

    /// Bits per channel.
    pub const BIT_DEPTH: u8 = 8;

    /// Wrap an owned RGB buffer.
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Build from raw interleaved RGB bytes; `None` if the length doesn't match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Self::new)
    }

    /// A single-color image, mostly useful in tests and benchmarks.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    pub fn bit_depth(&self) -> u8 {
        Self::BIT_DEPTH
    }

    /// Borrow the underlying buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Interleaved RGB bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// True if both images share the same buffer (no copy was made).
    pub fn ptr_eq(&self, other: &RasterImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Copy into a `DynamicImage` for codecs that want one.
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.pixels.as_ref().clone())
    }
}

impl From<RgbImage> for RasterImage {
    fn from(pixels: RgbImage) -> Self {
        Self::new(pixels)
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image.into_rgb8())
    }
}

/// Pixel-exact equality; a shared buffer short-circuits.
impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.width() == other.width()
                && self.height() == other.height()
                && self.as_bytes() == other.as_bytes())
    }
}

impl Eq for RasterImage {}
