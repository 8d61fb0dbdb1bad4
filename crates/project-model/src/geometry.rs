//! Coordinate mapping between preview space, normalized space, and source space.
//!
//! - **Preview space:** pixels of whatever view the clip is currently drawn in.
//!   Changes whenever the preview is resized (device rotation, window resize).
//! - **Normalized space:** `(0.0, 0.0)` is top-left, `(1.0, 1.0)` bottom-right
//!   of the source frame. This is what the operation log stores.
//! - **Source space:** pixels of the source media. Only produced at export.
//!
//! All math stays in `f64`; rounding to integer pixels happens only in the
//! functions that return [`PixelPoint`] / [`PixelRect`].

use serde::{Deserialize, Serialize};

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An integer pixel position in source space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

/// An integer pixel rectangle in source space, expressed by its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Corner handle of a rectangle being resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A rectangle in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    /// The entire frame.
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if a normalized point is within this rectangle.
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Move by a normalized delta, keeping the whole rectangle inside the frame.
    pub fn translated(&self, du: f64, dv: f64) -> Self {
        Self {
            x: (self.x + du).clamp(0.0, (1.0 - self.width).max(0.0)),
            y: (self.y + dv).clamp(0.0, (1.0 - self.height).max(0.0)),
            ..*self
        }
    }

    /// Drag one corner by a normalized delta. The opposite corner stays put
    /// and neither edge may come closer than `min_size` to its partner.
    pub fn resized(&self, corner: Corner, du: f64, dv: f64, min_size: f64) -> Self {
        let min_size = min_size.clamp(0.0, 1.0);
        let (mut left, mut top, mut right, mut bottom) =
            (self.x, self.y, self.right(), self.bottom());

        match corner {
            Corner::TopLeft => {
                left = (left + du).clamp(0.0, (right - min_size).max(0.0));
                top = (top + dv).clamp(0.0, (bottom - min_size).max(0.0));
            }
            Corner::TopRight => {
                right = (right + du).clamp((left + min_size).min(1.0), 1.0);
                top = (top + dv).clamp(0.0, (bottom - min_size).max(0.0));
            }
            Corner::BottomLeft => {
                left = (left + du).clamp(0.0, (right - min_size).max(0.0));
                bottom = (bottom + dv).clamp((top + min_size).min(1.0), 1.0);
            }
            Corner::BottomRight => {
                right = (right + du).clamp((left + min_size).min(1.0), 1.0);
                bottom = (bottom + dv).clamp((top + min_size).min(1.0), 1.0);
            }
        }

        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Aspect-ratio preset for the crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CropRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    FourFive,
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "9:16")]
    NineSixteen,
    #[serde(rename = "free")]
    Free,
}

impl CropRatio {
    /// Width-to-height ratio, `None` for free-form.
    pub fn aspect(self) -> Option<f64> {
        match self {
            CropRatio::Square => Some(1.0),
            CropRatio::FourFive => Some(4.0 / 5.0),
            CropRatio::SixteenNine => Some(16.0 / 9.0),
            CropRatio::NineSixteen => Some(9.0 / 16.0),
            CropRatio::Free => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CropRatio::Square => "1:1",
            CropRatio::FourFive => "4:5",
            CropRatio::SixteenNine => "16:9",
            CropRatio::NineSixteen => "9:16",
            CropRatio::Free => "free",
        }
    }

    /// Largest centered rectangle of this ratio that fits in 90% of a
    /// `frame_width` x `frame_height` frame, in normalized coordinates.
    pub fn fit(self, frame_width: f64, frame_height: f64) -> NormalizedRect {
        if frame_width <= 0.0 || frame_height <= 0.0 {
            return NormalizedRect::FULL;
        }

        let max_w = frame_width * 0.9;
        let max_h = frame_height * 0.9;

        let (w, h) = match self.aspect() {
            Some(ratio) => {
                let mut w = max_w;
                let mut h = w / ratio;
                if h > max_h {
                    h = max_h;
                    w = h * ratio;
                }
                (w, h)
            }
            None => (max_w, max_h),
        };

        let nw = w / frame_width;
        let nh = h / frame_height;
        NormalizedRect::new((1.0 - nw) / 2.0, (1.0 - nh) / 2.0, nw, nh)
    }
}

/// Map a preview pixel to normalized space. Out-of-range input (a drag that
/// overshoots the preview) is clamped into `[0, 1]`.
pub fn preview_to_normalized(
    px: f64,
    py: f64,
    preview_width: f64,
    preview_height: f64,
) -> Point2D {
    Point2D {
        x: normalize_axis(px, preview_width),
        y: normalize_axis(py, preview_height),
    }
}

/// Map a normalized point back to preview pixels.
pub fn normalized_to_preview(p: Point2D, preview_width: f64, preview_height: f64) -> (f64, f64) {
    (p.x * preview_width, p.y * preview_height)
}

/// Map a normalized point to unrounded source pixels.
pub fn normalized_to_source_exact(p: Point2D, source_width: u32, source_height: u32) -> (f64, f64) {
    (p.x * source_width as f64, p.y * source_height as f64)
}

/// Map a normalized point to source pixels, rounded to the nearest pixel.
pub fn normalized_to_source(p: Point2D, source_width: u32, source_height: u32) -> PixelPoint {
    let (x, y) = normalized_to_source_exact(p, source_width, source_height);
    PixelPoint {
        x: round_to_pixel(x, source_width),
        y: round_to_pixel(y, source_height),
    }
}

/// Map a source pixel position back to normalized space.
pub fn source_to_normalized(x: f64, y: f64, source_width: u32, source_height: u32) -> Point2D {
    Point2D {
        x: normalize_axis(x, source_width as f64),
        y: normalize_axis(y, source_height as f64),
    }
}

/// Map an x offset on a timeline track to a time in `[0, duration]`.
pub fn time_from_x(x: f64, track_width: f64, duration: f64) -> f64 {
    if track_width <= 0.0 || duration <= 0.0 || !x.is_finite() {
        return 0.0;
    }
    (x / track_width * duration).clamp(0.0, duration)
}

/// Map a time to an x offset on a timeline track.
pub fn x_from_time(t: f64, track_width: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (t / duration).clamp(0.0, 1.0) * track_width
}

/// Convert a rectangle drawn in preview pixels into normalized space.
/// The result is clipped to the frame.
pub fn preview_rect_to_normalized(
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    preview_width: f64,
    preview_height: f64,
) -> NormalizedRect {
    let tl = preview_to_normalized(left, top, preview_width, preview_height);
    let br = preview_to_normalized(left + width, top + height, preview_width, preview_height);
    NormalizedRect::new(
        tl.x.min(br.x),
        tl.y.min(br.y),
        (br.x - tl.x).abs(),
        (br.y - tl.y).abs(),
    )
}

/// Convert a normalized rectangle to source pixel edges.
pub fn denormalize_rect(rect: NormalizedRect, source_width: u32, source_height: u32) -> PixelRect {
    let top_left = normalized_to_source(Point2D::new(rect.x, rect.y), source_width, source_height);
    let bottom_right = normalized_to_source(
        Point2D::new(rect.right(), rect.bottom()),
        source_width,
        source_height,
    );
    PixelRect {
        left: top_left.x,
        top: top_left.y,
        right: bottom_right.x,
        bottom: bottom_right.y,
    }
}

fn normalize_axis(value: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / extent).clamp(0.0, 1.0)
}

fn round_to_pixel(value: f64, extent: u32) -> u32 {
    value.round().clamp(0.0, extent as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_to_normalized_clamps_overshoot() {
        let p = preview_to_normalized(-20.0, 900.0, 400.0, 800.0);
        assert_eq!(p, Point2D::new(0.0, 1.0));

        let p = preview_to_normalized(100.0, 200.0, 400.0, 800.0);
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_preview_maps_to_origin() {
        let p = preview_to_normalized(10.0, 10.0, 0.0, 0.0);
        assert_eq!(p, Point2D::new(0.0, 0.0));
    }

    #[test]
    fn test_normalized_to_source_rounds_at_boundary() {
        let p = normalized_to_source(Point2D::new(0.1, 0.1), 1080, 1920);
        assert_eq!(p, PixelPoint { x: 108, y: 192 });

        let p = normalized_to_source(Point2D::new(0.0004, 0.9999), 1000, 1000);
        assert_eq!(p, PixelPoint { x: 0, y: 1000 });
    }

    #[test]
    fn test_time_from_x_is_clamped() {
        assert_eq!(time_from_x(-5.0, 300.0, 30.0), 0.0);
        assert_eq!(time_from_x(450.0, 300.0, 30.0), 30.0);
        assert!((time_from_x(150.0, 300.0, 30.0) - 15.0).abs() < 1e-12);
        assert_eq!(time_from_x(10.0, 0.0, 30.0), 0.0);
    }

    #[test]
    fn test_x_from_time_inverts_time_from_x() {
        let x = x_from_time(7.5, 300.0, 30.0);
        assert!((time_from_x(x, 300.0, 30.0) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_denormalize_crop_scenario() {
        let rect = NormalizedRect::new(0.1, 0.1, 0.8, 0.8);
        let px = denormalize_rect(rect, 1080, 1920);
        assert_eq!(
            px,
            PixelRect {
                left: 108,
                top: 192,
                right: 972,
                bottom: 1728
            }
        );
        assert_eq!(px.width(), 864);
        assert_eq!(px.height(), 1536);
    }

    #[test]
    fn test_preview_rect_survives_preview_resize() {
        // Rect drawn on a 360x640 preview, shown again on a 720x1280 preview.
        let rect = preview_rect_to_normalized(36.0, 64.0, 288.0, 512.0, 360.0, 640.0);
        let (l, t) = normalized_to_preview(Point2D::new(rect.x, rect.y), 720.0, 1280.0);
        assert!((l - 72.0).abs() < 1e-9);
        assert!((t - 128.0).abs() < 1e-9);
        assert!((rect.width - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_translated_stays_inside_frame() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.4, 0.4);
        let moved = rect.translated(0.5, -0.9);
        assert!((moved.x - 0.6).abs() < 1e-12);
        assert_eq!(moved.y, 0.0);
        assert_eq!(moved.width, 0.4);
    }

    #[test]
    fn test_resized_respects_min_size() {
        let rect = NormalizedRect::new(0.2, 0.2, 0.4, 0.4);
        let shrunk = rect.resized(Corner::BottomRight, -1.0, -1.0, 0.05);
        assert!((shrunk.width - 0.05).abs() < 1e-12);
        assert!((shrunk.height - 0.05).abs() < 1e-12);
        assert_eq!(shrunk.x, 0.2);

        let grown = rect.resized(Corner::TopLeft, -0.5, -0.1, 0.05);
        assert_eq!(grown.x, 0.0);
        assert!((grown.y - 0.1).abs() < 1e-12);
        assert!((grown.right() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_crop_ratio_fit_square_on_portrait() {
        let rect = CropRatio::Square.fit(1080.0, 1920.0);
        let w_px = rect.width * 1080.0;
        let h_px = rect.height * 1920.0;
        assert!((w_px - h_px).abs() < 1e-6);
        assert!((w_px - 972.0).abs() < 1e-6);
        assert!((rect.x - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_crop_ratio_fit_wide_on_portrait_is_width_bound() {
        let rect = CropRatio::SixteenNine.fit(1080.0, 1920.0);
        assert!((rect.width - 0.9).abs() < 1e-12);
        let ratio = (rect.width * 1080.0) / (rect.height * 1920.0);
        assert!((ratio - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_ratio_serializes_as_label() {
        let json = serde_json::to_string(&CropRatio::NineSixteen).unwrap();
        assert_eq!(json, "\"9:16\"");
        assert_eq!(CropRatio::NineSixteen.label(), "9:16");
    }
}
