//! Bilinear resampling.

use crate::{Color, Image};

/// Samples `image` at the fractional position `(x, y)` by bilinearly blending the four
/// surrounding pixels.
///
/// The caller must ensure `x ∈ [0, width−1]` and `y ∈ [0, height−1]`; coordinates in the last
/// row/column clamp rather than read out of bounds.
pub fn sample_bilinear(image: &Image, x: f32, y: f32) -> Color {
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let tl = image.get(x0, y0);
    let tr = image.get(x1, y0);
    let bl = image.get(x0, y1);
    let br = image.get(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = tl[c] as f32 * (1.0 - fx) + tr[c] as f32 * fx;
        let bottom = bl[c] as f32 * (1.0 - fx) + br[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    Color(out)
}

/// Resamples `src` into `dst`, stretching or shrinking as necessary.
///
/// Pixel centers are mapped so that the images cover the same area; a same-size resize copies
/// the source exactly.
pub fn resize_bilinear_into(src: &Image, dst: &mut Image) {
    log::trace!("bilinear resize {} -> {}", src.resolution(), dst.resolution());

    let x_ratio = src.width() as f32 / dst.width() as f32;
    let y_ratio = src.height() as f32 / dst.height() as f32;
    for y in 0..dst.height() {
        let sy = ((y as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, src.height() as f32 - 1.0);
        for x in 0..dst.width() {
            let sx = ((x as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, src.width() as f32 - 1.0);
            dst.set(x, y, sample_bilinear(src, sx, sy));
        }
    }
}
