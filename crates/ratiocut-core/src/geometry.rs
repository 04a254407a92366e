//! Crop rectangle geometry under aspect-ratio constraints.
//!
//! All functions here are pure. Rectangles live in source-image integer
//! coordinates; ratios are kept as exact floating pairs so repeated drags
//! never accumulate rounding drift. Integer rounding happens once, at the
//! end of each operation, and is allowed to deviate from the exact ratio by
//! at most [`RATIO_TOLERANCE_PX`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeometryError;

/// Allowed deviation, in pixels, between a rectangle and its exact ratio.
pub const RATIO_TOLERANCE_PX: f64 = 1.0;

const EPSILON: f64 = 1e-9;

/// Pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A crop rectangle in source-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering the whole image.
    pub fn full(size: ImageSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// width / height as a float.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// An exact width:height ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    width: f64,
    height: f64,
}

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio::preset(1.0, 1.0);
    pub const PORTRAIT_2_3: AspectRatio = AspectRatio::preset(2.0, 3.0);
    pub const PORTRAIT_3_4: AspectRatio = AspectRatio::preset(3.0, 4.0);
    pub const PORTRAIT_9_16: AspectRatio = AspectRatio::preset(9.0, 16.0);
    pub const LANDSCAPE_3_2: AspectRatio = AspectRatio::preset(3.0, 2.0);
    pub const LANDSCAPE_4_3: AspectRatio = AspectRatio::preset(4.0, 3.0);
    pub const LANDSCAPE_16_9: AspectRatio = AspectRatio::preset(16.0, 9.0);

    /// The ratio buttons offered by the editor, in display order.
    pub const PRESETS: [AspectRatio; 7] = [
        Self::SQUARE,
        Self::PORTRAIT_2_3,
        Self::PORTRAIT_3_4,
        Self::PORTRAIT_9_16,
        Self::LANDSCAPE_3_2,
        Self::LANDSCAPE_4_3,
        Self::LANDSCAPE_16_9,
    ];

    const fn preset(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A custom ratio; both parts must be positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, GeometryError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(GeometryError::InvalidRatio { width, height });
        }
        Ok(Self { width, height })
    }

    /// The ratio a rectangle currently has.
    pub fn of_rect(rect: &CropRect) -> Result<Self, GeometryError> {
        Self::new(rect.width as f64, rect.height as f64)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// width / height.
    pub fn value(&self) -> f64 {
        self.width / self.height
    }

    /// Whether integer dimensions honor this ratio within one pixel of rounding.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let r = self.value();
        let (w, h) = (width as f64, height as f64);
        (h - w / r).abs() <= RATIO_TOLERANCE_PX + EPSILON
            || (w - h * r).abs() <= RATIO_TOLERANCE_PX + EPSILON
    }

    /// Lowest-terms label for display, e.g. `"16:9"`.
    ///
    /// Integral pairs are reduced by their GCD; anything else is approximated
    /// with a denominator of at most 100.
    pub fn label(&self) -> String {
        let (p, q) = if is_integral(self.width) && is_integral(self.height) {
            let (w, h) = (self.width.round() as u64, self.height.round() as u64);
            let g = gcd(w, h).max(1);
            (w / g, h / g)
        } else {
            approximate_fraction(self.value(), 100)
        };
        format!("{p}:{q}")
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = GeometryError;

    /// Parses `"16:9"`, `"16x9"` or a bare float such as `"1.5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidRatio {
            width: f64::NAN,
            height: f64::NAN,
        };
        let s = s.trim();
        match s.split_once([':', 'x', 'X']) {
            Some((w, h)) => {
                let w: f64 = w.trim().parse().map_err(|_| invalid())?;
                let h: f64 = h.trim().parse().map_err(|_| invalid())?;
                Self::new(w, h)
            }
            None => {
                let v: f64 = s.parse().map_err(|_| invalid())?;
                Self::new(v, 1.0)
            }
        }
    }
}

/// A crop overlay handle being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// Direction each edge moves: -1 = leading edge, +1 = trailing edge, 0 = untouched.
    fn directions(self) -> (i8, i8) {
        match self {
            Handle::TopLeft => (-1, -1),
            Handle::Top => (0, -1),
            Handle::TopRight => (1, -1),
            Handle::Right => (1, 0),
            Handle::BottomRight => (1, 1),
            Handle::Bottom => (0, 1),
            Handle::BottomLeft => (-1, 1),
            Handle::Left => (-1, 0),
        }
    }
}

/// Pointer movement in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragVector {
    pub dx: f64,
    pub dy: f64,
}

impl DragVector {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Affine mapping from image pixels to canvas pixels: `screen = image * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// A rectangle in canvas (display) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Check bounds containment, positive size, and (if locked) the ratio.
pub fn validate_rect(
    rect: &CropRect,
    size: ImageSize,
    ratio: Option<AspectRatio>,
) -> Result<(), GeometryError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(GeometryError::NonPositive {
            width: rect.width,
            height: rect.height,
        });
    }
    if rect.right() > size.width as u64 || rect.bottom() > size.height as u64 {
        return Err(GeometryError::OutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            image_width: size.width,
            image_height: size.height,
        });
    }
    if let Some(ratio) = ratio {
        if !ratio.matches(rect.width, rect.height) {
            return Err(GeometryError::RatioMismatch {
                width: rect.width,
                height: rect.height,
                expected: ratio.value(),
            });
        }
    }
    Ok(())
}

/// Largest rectangle of `ratio` centered in the image.
pub fn compute_initial_rect(
    size: ImageSize,
    ratio: AspectRatio,
) -> Result<CropRect, GeometryError> {
    if size.width == 0 || size.height == 0 {
        return Err(GeometryError::NonPositive {
            width: size.width,
            height: size.height,
        });
    }
    let max_w = size.width as f64;
    let max_h = size.height as f64;
    let target_w = max_w.min(max_h * ratio.value());
    let (width, height) = fit_ratio(target_w, max_w, max_h, ratio)?;

    let rect = CropRect::new(
        (size.width - width) / 2,
        (size.height - height) / 2,
        width,
        height,
    );
    validate_rect(&rect, size, Some(ratio))?;
    Ok(rect)
}

/// Resize by dragging one handle, keeping the opposite edge or corner anchored.
///
/// With a ratio lock the dragged dimension drives the other one (for corner
/// handles, whichever moved more relative to its size). The result is then
/// shrunk uniformly toward the anchor until it fits inside the image.
pub fn resize_rect(
    current: &CropRect,
    drag: DragVector,
    handle: Handle,
    ratio: Option<AspectRatio>,
    size: ImageSize,
) -> Result<CropRect, GeometryError> {
    validate_rect(current, size, ratio)?;
    if !(drag.dx.is_finite() && drag.dy.is_finite()) {
        return Err(GeometryError::Collapsed);
    }

    let (hx, hy) = handle.directions();
    let (x0, y0) = (current.x as f64, current.y as f64);
    let (w, h) = (current.width as f64, current.height as f64);
    let (x1, y1) = (x0 + w, y0 + h);
    let (img_w, img_h) = (size.width as f64, size.height as f64);

    let mut new_w = if hx != 0 { w + hx as f64 * drag.dx } else { w };
    let mut new_h = if hy != 0 { h + hy as f64 * drag.dy } else { h };

    // Room available on each axis given the anchor.
    let cx = x0 + w / 2.0;
    let cy = y0 + h / 2.0;
    let max_w = match hx {
        1 => img_w - x0,
        -1 => x1,
        _ => 2.0 * cx.min(img_w - cx),
    };
    let max_h = match hy {
        1 => img_h - y0,
        -1 => y1,
        _ => 2.0 * cy.min(img_h - cy),
    };

    let (width, height) = match ratio {
        Some(ratio) => {
            let r = ratio.value();
            let width_drives = match (hx, hy) {
                (_, 0) => true,
                (0, _) => false,
                _ => (new_w - w).abs() / w >= (new_h - h).abs() / h,
            };
            if width_drives {
                new_h = new_w / r;
            } else {
                new_w = new_h * r;
            }
            if new_w < 1.0 || new_h < 1.0 {
                return Err(GeometryError::Collapsed);
            }
            let target_w = new_w.min(max_w).min(max_h * r);
            fit_ratio(target_w, max_w, max_h, ratio)?
        }
        None => {
            if new_w < 1.0 || new_h < 1.0 {
                return Err(GeometryError::Collapsed);
            }
            let width = new_w.min(max_w).round().max(1.0) as u32;
            let height = new_h.min(max_h).round().max(1.0) as u32;
            (width, height)
        }
    };

    let x = match hx {
        1 => x0,
        -1 => x1 - width as f64,
        _ => (cx - width as f64 / 2.0).round(),
    };
    let y = match hy {
        1 => y0,
        -1 => y1 - height as f64,
        _ => (cy - height as f64 / 2.0).round(),
    };
    let x = x.clamp(0.0, (size.width - width) as f64) as u32;
    let y = y.clamp(0.0, (size.height - height) as f64) as u32;

    let rect = CropRect::new(x, y, width, height);
    validate_rect(&rect, size, ratio)?;
    Ok(rect)
}

/// Translate without resizing, clamped so the rectangle stays inside the image.
pub fn move_rect(
    current: &CropRect,
    drag: DragVector,
    size: ImageSize,
) -> Result<CropRect, GeometryError> {
    validate_rect(current, size, None)?;
    let dx = if drag.dx.is_finite() { drag.dx.round() } else { 0.0 };
    let dy = if drag.dy.is_finite() { drag.dy.round() } else { 0.0 };
    let max_x = (size.width - current.width) as f64;
    let max_y = (size.height - current.height) as f64;
    let x = (current.x as f64 + dx).clamp(0.0, max_x) as u32;
    let y = (current.y as f64 + dy).clamp(0.0, max_y) as u32;
    Ok(CropRect::new(x, y, current.width, current.height))
}

/// Map an image-space rectangle onto the canvas.
pub fn to_display_space(rect: &CropRect, transform: &CanvasTransform) -> ScreenRect {
    ScreenRect {
        x: rect.x as f64 * transform.scale + transform.offset_x,
        y: rect.y as f64 * transform.scale + transform.offset_y,
        width: rect.width as f64 * transform.scale,
        height: rect.height as f64 * transform.scale,
    }
}

/// Map a canvas selection back to image pixels.
///
/// The selection is intersected with the displayed image first; a selection
/// that misses the image entirely is rejected.
pub fn from_display_space(
    screen: &ScreenRect,
    transform: &CanvasTransform,
    size: ImageSize,
) -> Result<CropRect, GeometryError> {
    let scale = transform.scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(GeometryError::InvalidScale(scale));
    }
    let image = to_display_space(&CropRect::full(size), transform);

    let left = screen.x.max(image.x);
    let top = screen.y.max(image.y);
    let right = (screen.x + screen.width).min(image.x + image.width);
    let bottom = (screen.y + screen.height).min(image.y + image.height);
    if !(right - left > 0.0 && bottom - top > 0.0) {
        return Err(GeometryError::EmptySelection);
    }

    let x = ((left - image.x) / scale).round().max(0.0) as u32;
    let y = ((top - image.y) / scale).round().max(0.0) as u32;
    let x = x.min(size.width.saturating_sub(1));
    let y = y.min(size.height.saturating_sub(1));
    let width = (((right - left) / scale).round().max(1.0) as u32).min(size.width - x);
    let height = (((bottom - top) / scale).round().max(1.0) as u32).min(size.height - y);

    let rect = CropRect::new(x, y, width, height);
    validate_rect(&rect, size, None)?;
    Ok(rect)
}

/// Largest integer size of `ratio` with width near `target_w` that fits `max_w` x `max_h`.
fn fit_ratio(
    target_w: f64,
    max_w: f64,
    max_h: f64,
    ratio: AspectRatio,
) -> Result<(u32, u32), GeometryError> {
    let width = (target_w + EPSILON).floor().min((max_w + EPSILON).floor());
    if width < 1.0 {
        return Err(GeometryError::Collapsed);
    }
    let height = (width * ratio.height / ratio.width)
        .round()
        .min((max_h + EPSILON).floor());
    if height < 1.0 {
        return Err(GeometryError::Collapsed);
    }
    let (width, height) = (width as u32, height as u32);
    if !ratio.matches(width, height) {
        return Err(GeometryError::Collapsed);
    }
    Ok((width, height))
}

fn is_integral(v: f64) -> bool {
    (v - v.round()).abs() < 1e-6 && v.round() >= 1.0
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Continued-fraction approximation of `value` with denominator <= `max_den`.
fn approximate_fraction(value: f64, max_den: u64) -> (u64, u64) {
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let mut x = value;
    loop {
        let a = x.floor() as u64;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        let frac = x - x.floor();
        if frac < 1e-9 {
            break;
        }
        x = 1.0 / frac;
    }
    (p1, q1.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> ImageSize {
        ImageSize::new(w, h)
    }

    #[test]
    fn test_initial_rect_16_9_in_3000x2000() {
        let rect = compute_initial_rect(size(3000, 2000), AspectRatio::LANDSCAPE_16_9).unwrap();
        assert_eq!(rect, CropRect::new(0, 156, 3000, 1688));
    }

    #[test]
    fn test_initial_rect_square_is_centered() {
        let rect = compute_initial_rect(size(1200, 800), AspectRatio::SQUARE).unwrap();
        assert_eq!(rect, CropRect::new(200, 0, 800, 800));
    }

    #[test]
    fn test_initial_rect_portrait_in_landscape() {
        let rect = compute_initial_rect(size(1920, 1080), AspectRatio::PORTRAIT_9_16).unwrap();
        assert_eq!((rect.width, rect.height), (607, 1079));
        assert!(AspectRatio::PORTRAIT_9_16.matches(rect.width, rect.height));
        assert_eq!(rect.x, (1920 - 607) / 2);
    }

    #[test]
    fn test_resize_right_handle_keeps_ratio_and_left_edge() {
        let ratio = AspectRatio::LANDSCAPE_4_3;
        let start = CropRect::new(100, 100, 400, 300);
        let rect = resize_rect(
            &start,
            DragVector::new(80.0, 0.0),
            Handle::Right,
            Some(ratio),
            size(2000, 2000),
        )
        .unwrap();
        assert_eq!(rect.x, 100);
        assert_eq!(rect.width, 480);
        assert_eq!(rect.height, 360);
    }

    #[test]
    fn test_resize_clamped_by_bounds_shrinks_uniformly() {
        let ratio = AspectRatio::SQUARE;
        let start = CropRect::new(100, 100, 200, 200);
        let rect = resize_rect(
            &start,
            DragVector::new(5000.0, 5000.0),
            Handle::BottomRight,
            Some(ratio),
            size(1000, 600),
        )
        .unwrap();
        // Anchored at top-left; height limits the square.
        assert_eq!(rect, CropRect::new(100, 100, 500, 500));
    }

    #[test]
    fn test_resize_top_left_anchors_bottom_right() {
        let ratio = AspectRatio::LANDSCAPE_16_9;
        let start = compute_initial_rect(size(1600, 900), ratio).unwrap();
        let rect = resize_rect(
            &start,
            DragVector::new(160.0, 90.0),
            Handle::TopLeft,
            Some(ratio),
            size(1600, 900),
        )
        .unwrap();
        assert_eq!(rect.right(), start.right());
        assert_eq!(rect.bottom(), start.bottom());
        assert_eq!(rect.width, 1440);
        assert_eq!(rect.height, 810);
    }

    #[test]
    fn test_resize_always_contained_and_ratio_locked() {
        let img = size(3000, 2000);
        let drags = [
            (-500.0, 40.0),
            (900.0, -700.0),
            (3.3, 7.7),
            (-1.4, 2500.0),
            (1234.5, 0.0),
        ];
        let handles = [
            Handle::TopLeft,
            Handle::Top,
            Handle::TopRight,
            Handle::Right,
            Handle::BottomRight,
            Handle::Bottom,
            Handle::BottomLeft,
            Handle::Left,
        ];
        for ratio in AspectRatio::PRESETS {
            let start = compute_initial_rect(img, ratio).unwrap();
            let start = resize_rect(
                &start,
                DragVector::new(-300.0, -300.0),
                Handle::BottomRight,
                Some(ratio),
                img,
            )
            .unwrap();
            for handle in handles {
                for (dx, dy) in drags {
                    match resize_rect(&start, DragVector::new(dx, dy), handle, Some(ratio), img) {
                        Ok(rect) => {
                            assert!(validate_rect(&rect, img, Some(ratio)).is_ok());
                        }
                        Err(e) => assert_eq!(e, GeometryError::Collapsed),
                    }
                }
            }
        }
    }

    #[test]
    fn test_resize_rejects_rect_violating_ratio() {
        let err = resize_rect(
            &CropRect::new(0, 0, 400, 100),
            DragVector::new(10.0, 0.0),
            Handle::Right,
            Some(AspectRatio::SQUARE),
            size(1000, 1000),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::RatioMismatch { .. }));
    }

    #[test]
    fn test_resize_past_anchor_collapses() {
        let err = resize_rect(
            &CropRect::new(100, 100, 200, 200),
            DragVector::new(-400.0, 0.0),
            Handle::Right,
            Some(AspectRatio::SQUARE),
            size(1000, 1000),
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::Collapsed);
    }

    #[test]
    fn test_repeated_drags_do_not_drift() {
        let ratio = AspectRatio::new(7.0, 5.0).unwrap();
        let img = size(4000, 4000);
        let mut rect = compute_initial_rect(img, ratio).unwrap();
        for i in 0..200 {
            let d = if i % 2 == 0 { -13.7 } else { 13.7 };
            rect = resize_rect(&rect, DragVector::new(d, 0.0), Handle::Right, Some(ratio), img)
                .unwrap();
            assert!(ratio.matches(rect.width, rect.height));
        }
    }

    #[test]
    fn test_free_resize_without_ratio() {
        let rect = resize_rect(
            &CropRect::new(10, 10, 100, 100),
            DragVector::new(50.0, -30.0),
            Handle::BottomRight,
            None,
            size(500, 500),
        )
        .unwrap();
        assert_eq!(rect, CropRect::new(10, 10, 150, 70));
    }

    #[test]
    fn test_move_clamps_and_preserves_size() {
        let start = CropRect::new(100, 100, 300, 200);
        let rect = move_rect(&start, DragVector::new(10_000.0, -10_000.0), size(1000, 800)).unwrap();
        assert_eq!(rect, CropRect::new(700, 0, 300, 200));
    }

    #[test]
    fn test_validate_rejects_zero_and_out_of_bounds() {
        let img = size(100, 100);
        assert!(matches!(
            validate_rect(&CropRect::new(0, 0, 0, 10), img, None),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(matches!(
            validate_rect(&CropRect::new(50, 50, 60, 10), img, None),
            Err(GeometryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_display_space_round_trip() {
        let transform = CanvasTransform {
            scale: 0.25,
            offset_x: 40.0,
            offset_y: 12.0,
        };
        let img = size(4000, 3000);
        let rect = CropRect::new(400, 300, 1600, 900);
        let screen = to_display_space(&rect, &transform);
        assert_eq!(screen.x, 140.0);
        assert_eq!(screen.width, 400.0);
        assert_eq!(from_display_space(&screen, &transform, img).unwrap(), rect);
    }

    #[test]
    fn test_from_display_space_intersects_with_image() {
        let transform = CanvasTransform {
            scale: 0.5,
            offset_x: 100.0,
            offset_y: 100.0,
        };
        let screen = ScreenRect {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
        };
        let rect = from_display_space(&screen, &transform, size(1000, 1000)).unwrap();
        assert_eq!(rect, CropRect::new(0, 0, 200, 200));
    }

    #[test]
    fn test_from_display_space_rejects_miss() {
        let transform = CanvasTransform {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let screen = ScreenRect {
            x: 500.0,
            y: 500.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(
            from_display_space(&screen, &transform, size(100, 100)).unwrap_err(),
            GeometryError::EmptySelection
        );
    }

    #[test]
    fn test_ratio_labels() {
        assert_eq!(AspectRatio::new(1920.0, 1080.0).unwrap().label(), "16:9");
        assert_eq!(AspectRatio::LANDSCAPE_3_2.label(), "3:2");
        assert_eq!(AspectRatio::new(1.5, 1.0).unwrap().label(), "3:2");
        assert_eq!(AspectRatio::new(2.35, 1.0).unwrap().label(), "47:20");
    }

    #[test]
    fn test_ratio_parse() {
        let r: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(r, AspectRatio::LANDSCAPE_16_9);
        let r: AspectRatio = "5x4".parse().unwrap();
        assert_eq!(r.label(), "5:4");
        assert!("0:9".parse::<AspectRatio>().is_err());
        assert!("wide".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_ratio_matches_tolerance() {
        let r = AspectRatio::LANDSCAPE_16_9;
        assert!(r.matches(3000, 1688));
        assert!(r.matches(3840, 2160));
        assert!(!r.matches(3000, 2000));
    }
}
