//! Property tests for the coordinate mapping laws the operation log relies on.

use cutline_project_model::geometry::{
    denormalize_rect, normalized_to_preview, normalized_to_source_exact, preview_to_normalized,
    source_to_normalized, NormalizedRect, Point2D,
};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

proptest! {
    /// A normalized position survives being drawn on one preview size and
    /// read back from another (device rotation, window resize).
    #[test]
    fn normalized_point_survives_preview_resize(
        u in 0.0f64..=1.0,
        v in 0.0f64..=1.0,
        w1 in 1.0f64..4000.0,
        h1 in 1.0f64..4000.0,
        w2 in 1.0f64..4000.0,
        h2 in 1.0f64..4000.0,
    ) {
        let p = Point2D::new(u, v);
        let (px, py) = normalized_to_preview(p, w1, h1);
        let back = preview_to_normalized(px, py, w1, h1);
        let (qx, qy) = normalized_to_preview(back, w2, h2);
        let again = preview_to_normalized(qx, qy, w2, h2);

        prop_assert!((again.x - u).abs() < EPS);
        prop_assert!((again.y - v).abs() < EPS);
    }

    /// normalized -> source -> normalized is the identity in float space.
    #[test]
    fn source_mapping_inverts(
        u in 0.0f64..=1.0,
        v in 0.0f64..=1.0,
        sw in 1u32..8192,
        sh in 1u32..8192,
    ) {
        let (x, y) = normalized_to_source_exact(Point2D::new(u, v), sw, sh);
        let back = source_to_normalized(x, y, sw, sh);
        prop_assert!((back.x - u).abs() < EPS);
        prop_assert!((back.y - v).abs() < EPS);
    }

    /// A crop committed from a pixel rectangle denormalizes back to that
    /// rectangle within one pixel.
    #[test]
    fn crop_denormalizes_within_one_pixel(
        sw in 16u32..4096,
        sh in 16u32..4096,
        left_frac in 0.0f64..0.5,
        top_frac in 0.0f64..0.5,
        w_frac in 0.05f64..0.5,
        h_frac in 0.05f64..0.5,
    ) {
        let left = (left_frac * sw as f64).round();
        let top = (top_frac * sh as f64).round();
        let width = (w_frac * sw as f64).round().max(1.0);
        let height = (h_frac * sh as f64).round().max(1.0);

        let rect = NormalizedRect::new(
            left / sw as f64,
            top / sh as f64,
            width / sw as f64,
            height / sh as f64,
        );
        let px = denormalize_rect(rect, sw, sh);

        prop_assert!((px.left as f64 - left).abs() <= 1.0);
        prop_assert!((px.top as f64 - top).abs() <= 1.0);
        prop_assert!((px.right as f64 - (left + width)).abs() <= 1.0);
        prop_assert!((px.bottom as f64 - (top + height)).abs() <= 1.0);
    }
}
