//! Piecewise-affine triangle warping.

use nalgebra::Point2;

use henge_image::{sample_bilinear, Color, Image};
use henge_utils::geom::{point_in_triangle, Affine};

/// Warps the contents of `src_tri` in `src` onto `dst_tri` in `dst`.
///
/// Every destination pixel whose center lies inside `dst_tri` is inverse-mapped into the
/// source triangle and bilinearly sampled; the result is written with full alpha, which the
/// compositor later uses to tell warped pixels from untouched ones. Pixels that map outside
/// the source sampling range are skipped, as are degenerate triangles; each is a local no-op.
///
/// Neighboring triangles overlap by a pixel along shared edges and simply overwrite each
/// other; callers that need deterministic output must feed triangles in a fixed order.
pub fn warp_triangle(
    src: &Image,
    dst: &mut Image,
    src_tri: &[Point2<f32>; 3],
    dst_tri: &[Point2<f32>; 3],
) {
    let max_x = dst.width() as i64 - 1;
    let max_y = dst.height() as i64 - 1;

    let x0 = (dst_tri.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor() as i64).max(0);
    let y0 = (dst_tri.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor() as i64).max(0);
    let x1 = (dst_tri
        .iter()
        .map(|p| p.x)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil() as i64)
        .min(max_x);
    let y1 = (dst_tri
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil() as i64)
        .min(max_y);
    if x0 > x1 || y0 > y1 {
        return;
    }

    let Some(to_src) = Affine::from_triangles(dst_tri, src_tri) else {
        return;
    };

    let sample_w = src.width() as f32 - 1.0;
    let sample_h = src.height() as f32 - 1.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point2::new(x as f32, y as f32);
            if !point_in_triangle(p, dst_tri) {
                continue;
            }
            let s = to_src.apply(p);
            if s.x >= 0.0 && s.x < sample_w && s.y >= 0.0 && s.y < sample_h {
                let c = sample_bilinear(src, s.x, s.y);
                dst.set(x as u32, y as u32, Color::from_rgb8(c.r(), c.g(), c.b()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    fn gradient_image(size: u32) -> Image {
        let mut image = Image::new(size, size);
        for y in 0..size {
            for x in 0..size {
                image.set(x, y, Color::from_rgb8((x * 5) as u8, (y * 5) as u8, 77));
            }
        }
        image
    }

    #[test]
    fn identity_warp_copies_triangle_interior() {
        let src = gradient_image(32);
        let mut dst = Image::new(32, 32);
        let tri = [pt(2.0, 2.0), pt(28.0, 4.0), pt(6.0, 28.0)];

        warp_triangle(&src, &mut dst, &tri, &tri);

        // Interior pixels carry the source color with full alpha.
        assert_eq!(dst.get(10, 10), src.get(10, 10));
        assert_eq!(dst.get(10, 10).a(), 255);
        // Pixels outside the triangle stay untouched (alpha 0 sentinel).
        assert_eq!(dst.get(31, 31), Color::TRANSPARENT);
        assert_eq!(dst.get(0, 31), Color::TRANSPARENT);
    }

    #[test]
    fn translation_warp_shifts_pixels() {
        let src = gradient_image(32);
        let mut dst = Image::new(32, 32);
        let src_tri = [pt(2.0, 2.0), pt(14.0, 2.0), pt(2.0, 14.0)];
        let dst_tri = [pt(12.0, 12.0), pt(24.0, 12.0), pt(12.0, 24.0)];

        warp_triangle(&src, &mut dst, &src_tri, &dst_tri);

        assert_eq!(dst.get(15, 14), src.get(5, 4));
        assert_eq!(dst.get(2, 2), Color::TRANSPARENT);
    }

    #[test]
    fn degenerate_destination_is_a_noop() {
        let src = gradient_image(16);
        let mut dst = Image::new(16, 16);
        let src_tri = [pt(1.0, 1.0), pt(10.0, 1.0), pt(1.0, 10.0)];
        let line = [pt(2.0, 2.0), pt(5.0, 5.0), pt(8.0, 8.0)];

        warp_triangle(&src, &mut dst, &src_tri, &line);

        assert!(dst.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn offscreen_destination_is_clipped() {
        let src = gradient_image(16);
        let mut dst = Image::new(16, 16);
        let src_tri = [pt(1.0, 1.0), pt(10.0, 1.0), pt(1.0, 10.0)];
        let offscreen = [pt(-30.0, -30.0), pt(-20.0, -30.0), pt(-30.0, -20.0)];

        warp_triangle(&src, &mut dst, &src_tri, &offscreen);

        assert!(dst.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn samples_outside_source_are_skipped() {
        let src = gradient_image(8);
        let mut dst = Image::new(32, 32);
        // Destination triangle maps back to a source triangle partially outside the image.
        let src_tri = [pt(-10.0, 2.0), pt(6.0, 2.0), pt(-10.0, 18.0)];
        let dst_tri = [pt(2.0, 2.0), pt(18.0, 2.0), pt(2.0, 18.0)];

        warp_triangle(&src, &mut dst, &src_tri, &dst_tri);

        // The left part of the destination maps to negative source x and must stay empty.
        assert_eq!(dst.get(3, 3), Color::TRANSPARENT);
        // The right part maps into the source and is written.
        assert_eq!(dst.get(14, 3).a(), 255);
    }
}
