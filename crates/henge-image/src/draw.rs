//! Transformed sprite drawing.

use henge_utils::geom::Affine;
use nalgebra::Point2;

use crate::{sample_bilinear, Image, Rect};

/// Draws `sprite` onto `canvas`, placed by an affine transform.
///
/// `transform` maps sprite pixel coordinates (top-left origin) to canvas coordinates and may
/// rotate, scale, and mirror. Each covered canvas pixel is inverse-mapped into the sprite,
/// sampled bilinearly, and alpha-blended over the canvas. Degenerate transforms draw nothing.
pub fn draw_sprite(canvas: &mut Image, sprite: &Image, transform: &Affine) {
    if sprite.width() == 0 || sprite.height() == 0 {
        return;
    }
    let Some(inverse) = transform.invert() else {
        log::debug!("draw_sprite: degenerate transform, skipping");
        return;
    };

    let w = sprite.width() as f32;
    let h = sprite.height() as f32;
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(0.0, h),
        Point2::new(w, h),
    ];
    let bounds = Rect::bounding(corners.iter().map(|&c| {
        let p = transform.apply(c);
        (p.x.floor() as i32, p.y.floor() as i32)
    }));
    let Some(bounds) = bounds.and_then(|b| b.intersection(&canvas.rect())) else {
        return;
    };

    for y in bounds.y()..bounds.y() + bounds.height() as i32 {
        for x in bounds.x()..bounds.x() + bounds.width() as i32 {
            let s = inverse.apply(Point2::new(x as f32, y as f32));
            if s.x < 0.0 || s.x > w - 1.0 || s.y < 0.0 || s.y > h - 1.0 {
                continue;
            }
            let src = sample_bilinear(sprite, s.x, s.y);
            let alpha = src.a() as f32 / 255.0;
            if alpha <= 0.0 {
                continue;
            }

            let dst = canvas.get(x as u32, y as u32);
            let mut blended = [0u8; 4];
            for c in 0..3 {
                blended[c] =
                    (src[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
            }
            blended[3] = ((alpha + dst.a() as f32 / 255.0 * (1.0 - alpha)) * 255.0).round() as u8;
            canvas.set(x as u32, y as u32, crate::Color(blended));
        }
    }
}
