//! The morph orchestrator.
//!
//! A [`Morpher`] ties the pipeline together: landmark validation, target scaling, Delaunay
//! triangulation over the key index set, per-triangle warping, mask construction, color
//! correction, and the final masked blend. It carries no global state beyond the fixed index
//! tables and a scratch-buffer pool, so independent instances can morph disjoint buffers in
//! parallel.

use itertools::izip;

use henge_image::{resize_bilinear_into, Color, Image, Mask, Resolution};
use henge_utils::geom::triangle_area;
use henge_utils::timer::Timer;

use crate::color::correct_colors;
use crate::delaunay::triangulate;
use crate::landmark::{Landmarks, KEY_TRIANGULATION, MIN_LANDMARKS};
use crate::mask::{hull_mask, mouth_mask, FEATHER_RADII};
use crate::warp::warp_triangle;
use crate::Error;

/// Triangles with less unsigned area than this (in pixels²) are skipped during warping.
const DEFAULT_MIN_TRIANGLE_AREA: f32 = 1.0;

/// Blend factors at or below this leave the source pixel untouched.
const BLEND_CUTOFF: f32 = 0.01;

/// With an animal target, mask weights above this blend at full configured strength; the
/// feather is abandoned because animal targets diverge too much from human skin tones for
/// graceful low-opacity blending.
const ANIMAL_MASK_CUTOFF: f32 = 0.1;

/// Above this blend strength the mask weight is square-rooted, widening the confident-blend
/// region without hardening the feather edge.
const FULL_STRENGTH_THRESHOLD: f32 = 0.95;

/// Reusable per-resolution buffers. Invalidated whenever the source dimensions change.
struct Scratch {
    resolution: Resolution,
    scaled_target: Image,
    warped: Image,
}

impl Scratch {
    fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            scaled_target: Image::new(resolution.width(), resolution.height()),
            warped: Image::new(resolution.width(), resolution.height()),
        }
    }
}

/// The face-morphing engine.
///
/// One instance is meant to be driven once per camera frame; scratch buffers are pooled
/// across calls. The engine performs no I/O and is single-threaded and synchronous per call.
pub struct Morpher {
    feather_radii: Vec<u32>,
    min_triangle_area: f32,
    scratch: Option<Scratch>,
    t_mesh: Timer,
    t_warp: Timer,
    t_mask: Timer,
    t_blend: Timer,
}

impl Morpher {
    pub fn new() -> Self {
        Self {
            feather_radii: FEATHER_RADII.to_vec(),
            min_triangle_area: DEFAULT_MIN_TRIANGLE_AREA,
            scratch: None,
            t_mesh: Timer::new("mesh"),
            t_warp: Timer::new("warp"),
            t_mask: Timer::new("mask"),
            t_blend: Timer::new("blend"),
        }
    }

    /// Replaces the feathering blur radii of the face mask.
    ///
    /// By default [`FEATHER_RADII`] is used.
    pub fn set_feather_radii(&mut self, radii: &[u32]) {
        self.feather_radii = radii.to_vec();
    }

    /// Sets the minimum triangle area (in pixels²) below which mesh triangles are skipped.
    pub fn set_min_triangle_area(&mut self, area: f32) {
        self.min_triangle_area = area;
    }

    /// Returns profiling timers for the triangulation, warp, mask, and blend stages.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_mesh, &self.t_warp, &self.t_mask, &self.t_blend].into_iter()
    }

    /// Morphs `target`'s facial features onto `src`'s face geometry, writing the result to
    /// `out`.
    ///
    /// `src_landmarks` annotate `src`, `target_landmarks` annotate `target`, each in its own
    /// image's pixel space. `alpha` is the blend strength in `0..=1`; `animal` switches to the
    /// hard-edged blend used for non-human targets (and disables the mouth-interior restore).
    ///
    /// On every recoverable failure ([`Error::InsufficientLandmarks`],
    /// [`Error::DegenerateMesh`], [`Error::MaskConstructionFailed`]) the output contains an
    /// unmodified copy of the source. [`Error::DimensionMismatch`] is fatal for the call and
    /// writes nothing.
    pub fn morph(
        &mut self,
        src: &Image,
        target: &Image,
        src_landmarks: &Landmarks,
        target_landmarks: &Landmarks,
        alpha: f32,
        out: &mut Image,
        animal: bool,
    ) -> Result<(), Error> {
        if out.resolution() != src.resolution() {
            return Err(Error::DimensionMismatch {
                src: src.resolution(),
                out: out.resolution(),
            });
        }
        out.copy_from(src);

        let src_valid = src_landmarks.valid_count();
        if src_valid < MIN_LANDMARKS {
            return Err(Error::InsufficientLandmarks(src_valid));
        }
        let target_valid = target_landmarks.valid_count();
        if target_valid < MIN_LANDMARKS {
            return Err(Error::InsufficientLandmarks(target_valid));
        }

        let resolution = src.resolution();
        let (width, height) = (resolution.width(), resolution.height());

        // Bring target landmarks into source pixel space. The mesh is triangulated over the
        // *target's* configuration and then indexed against both landmark sets; target
        // landmarks are static per asset, which keeps the mesh stable across frames.
        let scaled_lm = target_landmarks.scaled(
            width as f32 / target.width() as f32,
            height as f32 / target.height() as f32,
        );
        let triangles = self.t_mesh.time(|| {
            build_mesh(
                &scaled_lm,
                width,
                height,
                src_landmarks.len().min(target_landmarks.len()),
            )
        });
        if triangles.is_empty() {
            return Err(Error::DegenerateMesh);
        }

        let mut scratch = match self.scratch.take() {
            Some(scratch) if scratch.resolution == resolution => scratch,
            _ => Scratch::new(resolution),
        };
        resize_bilinear_into(target, &mut scratch.scaled_target);
        scratch.warped.clear(Color::TRANSPARENT);

        self.t_warp.time(|| {
            let mut rejected = 0usize;
            for tri in &triangles {
                let (Some(s0), Some(s1), Some(s2)) = (
                    src_landmarks.get(tri[0]),
                    src_landmarks.get(tri[1]),
                    src_landmarks.get(tri[2]),
                ) else {
                    rejected += 1;
                    continue;
                };
                let (Some(t0), Some(t1), Some(t2)) = (
                    scaled_lm.get(tri[0]),
                    scaled_lm.get(tri[1]),
                    scaled_lm.get(tri[2]),
                ) else {
                    rejected += 1;
                    continue;
                };
                // The target triangle is sampled, the source triangle is where it lands.
                let source_tri = [s0, s1, s2];
                let target_tri = [t0, t1, t2];
                if triangle_area(&source_tri) < self.min_triangle_area
                    || triangle_area(&target_tri) < self.min_triangle_area
                {
                    rejected += 1;
                    continue;
                }
                warp_triangle(
                    &scratch.scaled_target,
                    &mut scratch.warped,
                    &target_tri,
                    &source_tri,
                );
            }
            log::trace!(
                "warped {} of {} mesh triangles",
                triangles.len() - rejected,
                triangles.len()
            );
        });

        let hull = match self
            .t_mask
            .time(|| hull_mask(src_landmarks, width, height, &self.feather_radii))
        {
            Ok(hull) => hull,
            Err(err) => {
                self.scratch = Some(scratch);
                return Err(err);
            }
        };
        let mouth = if animal {
            None
        } else {
            mouth_mask(src_landmarks, width, height)
        };

        correct_colors(&mut scratch.warped, src, &hull);

        self.t_blend.time(|| {
            composite(src, &scratch.warped, &hull, mouth.as_ref(), alpha, animal, out)
        });

        self.scratch = Some(scratch);
        Ok(())
    }
}

impl Default for Morpher {
    fn default() -> Self {
        Self::new()
    }
}

/// Triangulates the valid key-index landmarks, returning triangles over landmark indices.
///
/// Triangles referring past `landmark_len` are dropped so lookups into either landmark set
/// cannot go out of range.
fn build_mesh(
    scaled_lm: &Landmarks,
    width: u32,
    height: u32,
    landmark_len: usize,
) -> Vec<[usize; 3]> {
    let mut indices = Vec::with_capacity(KEY_TRIANGULATION.len());
    let mut points = Vec::with_capacity(KEY_TRIANGULATION.len());
    for &index in KEY_TRIANGULATION.iter() {
        if let Some(point) = scaled_lm.get(index) {
            indices.push(index);
            points.push(point);
        }
    }

    triangulate(&points, width, height)
        .into_iter()
        .map(|tri| [indices[tri[0]], indices[tri[1]], indices[tri[2]]])
        .filter(|tri| tri.iter().all(|&i| i < landmark_len))
        .collect()
}

/// Per-pixel blend of source and color-corrected warp under the feathered mask.
fn composite(
    src: &Image,
    warped: &Image,
    hull: &Mask,
    mouth: Option<&Mask>,
    alpha: f32,
    animal: bool,
    out: &mut Image,
) {
    let mut blended = 0usize;
    for (i, (mask_value, src_px, warped_px, out_px)) in izip!(
        hull.data(),
        src.data().chunks_exact(4),
        warped.data().chunks_exact(4),
        out.data_mut().chunks_exact_mut(4),
    )
    .enumerate()
    {
        let m = *mask_value as f32 / 255.0;
        let beta = if animal {
            if m > ANIMAL_MASK_CUTOFF {
                alpha
            } else {
                0.0
            }
        } else if alpha > FULL_STRENGTH_THRESHOLD {
            m.sqrt() * alpha
        } else {
            m * alpha
        };

        if warped_px[3] > 0 && beta > BLEND_CUTOFF {
            let mu = mouth.map_or(0.0, |mouth| mouth.data()[i] as f32 / 255.0);
            for c in 0..3 {
                let morphed = src_px[c] as f32 * (1.0 - beta) + warped_px[c] as f32 * beta;
                out_px[c] = (morphed * (1.0 - mu) + src_px[c] as f32 * mu).round() as u8;
            }
            blended += 1;
        } else {
            out_px[..3].copy_from_slice(&src_px[..3]);
        }
        out_px[3] = 255;
    }
    log::trace!("composite: {blended} pixels blended");
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use crate::interp::{interpolate_478, KeyPoints};
    use crate::landmark::INNER_LIPS;

    use super::*;

    /// A plausible full landmark set for a face centered in a `size`×`size` image.
    fn face_landmarks(size: f32) -> Landmarks {
        let keys = KeyPoints {
            left_eye: Point2::new(size * 0.35, size * 0.40),
            right_eye: Point2::new(size * 0.65, size * 0.40),
            nose: Point2::new(size * 0.50, size * 0.55),
            mouth_left: Point2::new(size * 0.40, size * 0.70),
            mouth_right: Point2::new(size * 0.60, size * 0.70),
            chin: Point2::new(size * 0.50, size * 0.88),
            left_cheek: Point2::new(size * 0.20, size * 0.55),
            right_cheek: Point2::new(size * 0.80, size * 0.55),
        };
        Landmarks::from_pixel_pairs(&interpolate_478(&keys))
    }

    fn checkerboard(size: u32, cell: u32) -> Image {
        let mut image = Image::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 {
                    Color::from_rgb8(230, 230, 230)
                } else {
                    Color::from_rgb8(25, 25, 25)
                };
                image.set(x, y, color);
            }
        }
        image
    }

    fn uniform(size: u32, color: Color) -> Image {
        let mut image = Image::new(size, size);
        image.clear(color);
        image
    }

    #[test]
    fn identity_morph_reproduces_source() {
        let src = checkerboard(128, 16);
        let landmarks = face_landmarks(128.0);
        let mut out = Image::new(128, 128);
        let mut morpher = Morpher::new();

        morpher
            .morph(&src, &src, &landmarks, &landmarks, 1.0, &mut out, false)
            .unwrap();

        for (s, o) in src.data().chunks_exact(4).zip(out.data().chunks_exact(4)) {
            for c in 0..3 {
                assert!(
                    (s[c] as i16 - o[c] as i16).abs() <= 1,
                    "channel diverged: {s:?} vs {o:?}"
                );
            }
            assert_eq!(o[3], 255);
        }
    }

    #[test]
    fn zero_alpha_is_byte_exact_passthrough() {
        let src = checkerboard(128, 16);
        let target = uniform(128, Color::from_rgb8(80, 160, 40));
        let landmarks = face_landmarks(128.0);
        let mut out = Image::new(128, 128);
        let mut morpher = Morpher::new();

        morpher
            .morph(&src, &target, &landmarks, &landmarks, 0.0, &mut out, false)
            .unwrap();

        assert_eq!(src.data(), out.data());
    }

    #[test]
    fn insufficient_landmarks_copies_source() {
        let src = checkerboard(64, 8);
        let target = uniform(64, Color::BLUE);
        let short = Landmarks::new(399);
        let full = face_landmarks(64.0);
        let mut out = Image::new(64, 64);
        let mut morpher = Morpher::new();

        let result = morpher.morph(&src, &target, &short, &full, 1.0, &mut out, false);
        assert!(matches!(result, Err(Error::InsufficientLandmarks(0))));
        assert_eq!(src.data(), out.data());
    }

    #[test]
    fn dimension_mismatch_is_fatal_and_writes_nothing() {
        let src = checkerboard(64, 8);
        let target = uniform(64, Color::BLUE);
        let landmarks = face_landmarks(64.0);
        let mut out = uniform(32, Color::RED);
        let mut morpher = Morpher::new();

        let result = morpher.morph(&src, &target, &landmarks, &landmarks, 1.0, &mut out, false);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        // The mismatched buffer was not touched at all.
        assert!(out.data().chunks_exact(4).all(|px| px == &[255, 0, 0, 255][..]));
    }

    #[test]
    fn offscreen_landmarks_degenerate_the_mesh() {
        let src = checkerboard(64, 8);
        let target = uniform(64, Color::BLUE);
        let src_lm = face_landmarks(64.0);
        // Valid landmark count, but every point is far outside the target image, so the
        // triangulation has nothing to work with.
        let mut far = Landmarks::new(478);
        for i in 0..478 {
            far.set(i, Point2::new(-1000.0, -1000.0));
        }
        let mut out = Image::new(64, 64);
        let mut morpher = Morpher::new();

        let result = morpher.morph(&src, &target, &src_lm, &far, 1.0, &mut out, false);
        assert!(matches!(result, Err(Error::DegenerateMesh)));
        assert_eq!(src.data(), out.data());
    }

    #[test]
    fn pixels_outside_the_mask_stay_source() {
        let src = checkerboard(256, 32);
        let target = uniform(256, Color::from_rgb8(200, 30, 30));
        let landmarks = face_landmarks(256.0);
        let mut out = Image::new(256, 256);
        let mut morpher = Morpher::new();

        morpher
            .morph(&src, &target, &landmarks, &landmarks, 0.8, &mut out, false)
            .unwrap();

        let hull = hull_mask(&landmarks, 256, 256, &FEATHER_RADII).unwrap();
        for y in 0..256 {
            for x in 0..256 {
                if hull.get(x, y) == 0 {
                    assert_eq!(out.get(x, y).0[..3], src.get(x, y).0[..3]);
                }
                assert_eq!(out.get(x, y).a(), 255);
            }
        }
    }

    #[test]
    fn rotated_target_morphs_back_onto_source_geometry() {
        // A checkerboard with an odd number of cells per side is invariant under a 90°
        // rotation, so the morphed output must reproduce the (rotated) pattern wherever the
        // warp contributes.
        let size = 100;
        let src = checkerboard(size, 20);
        let mut target = Image::new(size, size);
        for y in 0..size {
            for x in 0..size {
                target.set(x, y, src.get(y, size - 1 - x));
            }
        }

        let src_lm = face_landmarks(size as f32);
        // The target shows the same face rotated 90° clockwise: each landmark moves to its
        // rotated position.
        let mut target_lm = Landmarks::new(478);
        for i in 0..478 {
            if let Some(p) = src_lm.get(i) {
                target_lm.set(i, Point2::new(size as f32 - 1.0 - p.y, p.x));
            }
        }

        let mut out = Image::new(size, size);
        let mut morpher = Morpher::new();
        morpher
            .morph(&src, &target, &src_lm, &target_lm, 1.0, &mut out, false)
            .unwrap();

        let mismatched = src
            .data()
            .chunks_exact(4)
            .zip(out.data().chunks_exact(4))
            .filter(|(s, o)| (s[0] as i16 - o[0] as i16).abs() > 16)
            .count();
        assert!(
            mismatched < (size * size) as usize / 10,
            "{mismatched} mismatched pixels"
        );
    }

    #[test]
    fn open_mouth_interior_keeps_source_pixels() {
        let size = 128;
        let skin = Color::from_rgb8(210, 170, 140);
        let mut src = uniform(size, skin);

        let mut src_lm = face_landmarks(size as f32);
        // Open the mouth: an elliptical inner-lip walk around (64, 88), 36px wide and 20px
        // tall, painted green inside.
        let (cx, cy) = (64.0f32, 88.0f32);
        for (step, &index) in INNER_LIPS.iter().enumerate() {
            let angle = std::f32::consts::PI
                - step as f32 / INNER_LIPS.len() as f32 * std::f32::consts::TAU;
            src_lm.set(
                index,
                Point2::new(cx + 18.0 * angle.cos(), cy + 10.0 * angle.sin()),
            );
        }
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 - cx) / 18.0;
                let dy = (y as f32 - cy) / 10.0;
                if dx * dx + dy * dy <= 1.0 {
                    src.set(x, y, Color::from_rgb8(20, 220, 20));
                }
            }
        }

        let target = uniform(size, Color::from_rgb8(150, 150, 150));
        let target_lm = face_landmarks(size as f32);
        let mut out = Image::new(size, size);
        let mut morpher = Morpher::new();
        morpher
            .morph(&src, &target, &src_lm, &target_lm, 1.0, &mut out, false)
            .unwrap();

        // Deep inside the inner-lip polygon the source's (green) teeth pixels survive.
        for (x, y) in [(64, 88), (60, 85), (70, 90)] {
            let out_px = out.get(x, y);
            let src_px = src.get(x, y);
            for c in 0..3 {
                assert!(
                    (out_px[c] as i16 - src_px[c] as i16).abs() <= 10,
                    "mouth interior changed at ({x}, {y}): {out_px:?} vs {src_px:?}"
                );
            }
        }
    }

    #[test]
    fn animal_blend_hardens_the_mask_edge() {
        let src = uniform(128, Color::from_rgb8(200, 180, 160));
        let target = uniform(128, Color::from_rgb8(60, 60, 60));
        let landmarks = face_landmarks(128.0);
        let mut out = Image::new(128, 128);
        let mut morpher = Morpher::new();

        morpher
            .morph(&src, &target, &landmarks, &landmarks, 0.5, &mut out, true)
            .unwrap();

        let hull = hull_mask(&landmarks, 128, 128, &FEATHER_RADII).unwrap();
        // Wherever the mask weight is below the animal cutoff, the source must be untouched
        // even though regular blending would still mix a little.
        for y in 0..128 {
            for x in 0..128 {
                if f32::from(hull.get(x, y)) / 255.0 <= 0.1 {
                    assert_eq!(out.get(x, y).0[..3], src.get(x, y).0[..3]);
                }
            }
        }
    }

    #[test]
    fn scratch_pool_survives_resolution_changes() {
        let landmarks_small = face_landmarks(64.0);
        let landmarks_large = face_landmarks(128.0);
        let small = checkerboard(64, 8);
        let large = checkerboard(128, 16);
        let mut out_small = Image::new(64, 64);
        let mut out_large = Image::new(128, 128);
        let mut morpher = Morpher::new();

        morpher
            .morph(&small, &small, &landmarks_small, &landmarks_small, 0.5, &mut out_small, false)
            .unwrap();
        morpher
            .morph(&large, &large, &landmarks_large, &landmarks_large, 0.5, &mut out_large, false)
            .unwrap();
        let first = out_large.data().to_vec();

        // Re-running at the same resolution reuses the pooled buffers and must not change
        // the result.
        morpher
            .morph(&large, &large, &landmarks_large, &landmarks_large, 0.5, &mut out_large, false)
            .unwrap();
        assert_eq!(out_large.data(), &first[..]);
    }
}
