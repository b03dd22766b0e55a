//! Deterministic expansion of 8 hand-placed key points into a full 478-point landmark set.
//!
//! The asset editor lets a user mark 8 semantic points (eyes, nose, mouth corners, chin,
//! cheeks) on an arbitrary image; this module synthesizes the remaining face-mesh landmarks
//! from them. The synthesized set is geometrically crude (rings, bands, and a grid), but it
//! lands every anchor index the morph pipeline cares about in a sensible spot, which is all
//! piecewise-affine warping needs.
//!
//! Assignment rules are ordered; an index claimed by an earlier rule is never overwritten by
//! a later one. The rule order is part of the output contract, since asset files produced by
//! the editor must stay stable across versions.

use std::f32::consts::{PI, TAU};

use nalgebra::Point2;

use henge_utils::num::lerp;

use crate::Error;

/// Number of points produced by [`interpolate_478`].
pub const INTERPOLATED_POINTS: usize = 478;

/// The 8 editor key points, in image pixel space.
#[derive(Debug, Clone, Copy)]
pub struct KeyPoints {
    pub left_eye: Point2<f32>,
    pub right_eye: Point2<f32>,
    pub nose: Point2<f32>,
    pub mouth_left: Point2<f32>,
    pub mouth_right: Point2<f32>,
    pub chin: Point2<f32>,
    pub left_cheek: Point2<f32>,
    pub right_cheek: Point2<f32>,
}

impl KeyPoints {
    /// Builds key points from 8 `[x, y]` pairs in the editor's order: left eye, right eye,
    /// nose, mouth left, mouth right, chin, left cheek, right cheek.
    pub fn from_pairs(pairs: &[[f32; 2]; 8]) -> Self {
        let p = |i: usize| Point2::new(pairs[i][0], pairs[i][1]);
        Self {
            left_eye: p(0),
            right_eye: p(1),
            nose: p(2),
            mouth_left: p(3),
            mouth_right: p(4),
            chin: p(5),
            left_cheek: p(6),
            right_cheek: p(7),
        }
    }
}

/// Expands the 8 key points into exactly 478 integer landmark positions.
pub fn interpolate_478(keys: &KeyPoints) -> Vec<[i32; 2]> {
    let eye_center = keys.left_eye + (keys.right_eye - keys.left_eye) * 0.5;
    let eye_width = (keys.right_eye.x - keys.left_eye.x).abs();
    let face_width = (keys.right_cheek.x - keys.left_cheek.x).abs();
    let face_height = 2.0 * (keys.chin.y - eye_center.y).abs();

    let mut points = vec![None::<Point2<f32>>; INTERPOLATED_POINTS];

    // Feature rings around the individually placed key points.
    ring(&mut points, 33, 6, keys.left_eye, 0.15 * eye_width);
    ring(&mut points, 263, 6, keys.right_eye, 0.15 * eye_width);
    ring(&mut points, 1, 5, keys.nose, 0.10 * face_width);
    ring(&mut points, 61, 7, keys.mouth_left, 0.05 * face_width);
    ring(&mut points, 291, 7, keys.mouth_right, 0.05 * face_width);

    // Exact copies of the anchor landmarks.
    assign(&mut points, 152, keys.chin);
    assign(&mut points, 234, keys.left_cheek);
    assign(&mut points, 454, keys.right_cheek);

    // Forehead band, linearly across the cheeks.
    let forehead_y = eye_center.y - 0.3 * face_height;
    for k in 0..10 {
        let t = k as f32 / 9.0;
        assign(
            &mut points,
            k,
            Point2::new(lerp(keys.left_cheek.x, keys.right_cheek.x, t), forehead_y),
        );
    }

    // Face contour: half-ellipse from the left cheek to the right cheek via the chin.
    for index in 10..=152 {
        let t = (index - 10) as f32 / 142.0;
        assign(
            &mut points,
            index,
            Point2::new(
                eye_center.x + 0.5 * face_width * (PI * (1.0 - t)).cos(),
                eye_center.y + 0.5 * face_height * (PI * t).sin(),
            ),
        );
    }

    // Nose bridge, from between the eyes down to the nose tip.
    for k in 0..8 {
        let t = k as f32 / 7.0;
        assign(&mut points, 168 + k, eye_center + (keys.nose - eye_center) * t);
    }

    // Mouth band with a slight sinusoidal lip curve.
    for index in 61..=291 {
        let t = (index - 61) as f32 / 230.0;
        assign(
            &mut points,
            index,
            Point2::new(
                lerp(keys.mouth_left.x, keys.mouth_right.x, t),
                lerp(keys.mouth_left.y, keys.mouth_right.y, t)
                    + 0.05 * face_height * (TAU * t).sin(),
            ),
        );
    }

    // Sinusoidal eye bands.
    for index in 33..=133 {
        let t = (index - 33) as f32 / 100.0;
        assign(&mut points, index, eye_band_point(keys.left_eye, eye_width, face_height, t));
    }
    for index in 263..=362 {
        let t = (index - 263) as f32 / 99.0;
        assign(&mut points, index, eye_band_point(keys.right_eye, eye_width, face_height, t));
    }

    // Everything else: a 20×24 grid over the face rectangle.
    let grid_left = keys.left_cheek.x;
    let grid_right = keys.right_cheek.x;
    let grid_top = eye_center.y - 0.5 * face_height;
    let grid_bottom = eye_center.y + 0.5 * face_height;
    points
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            let p = point.unwrap_or_else(|| {
                let col = (index % 20) as f32 / 19.0;
                let row = ((index / 20) % 24) as f32 / 23.0;
                Point2::new(
                    lerp(grid_left, grid_right, col),
                    lerp(grid_top, grid_bottom, row),
                )
            });
            [p.x.round() as i32, p.y.round() as i32]
        })
        .collect()
}

/// Serializes editor output: a JSON array of exactly 478 `[x, y]` integer pairs, compatible
/// with the landmark ingestion format.
pub fn to_json(points: &[[i32; 2]]) -> Result<String, Error> {
    Ok(serde_json::to_string(points)?)
}

fn assign(points: &mut [Option<Point2<f32>>], index: usize, point: Point2<f32>) {
    if points[index].is_none() {
        points[index] = Some(point);
    }
}

/// Evenly spaced points on a circle, at consecutive indices starting at `first`.
fn ring(points: &mut [Option<Point2<f32>>], first: usize, count: usize, center: Point2<f32>, radius: f32) {
    for k in 0..count {
        let angle = k as f32 / count as f32 * TAU;
        assign(
            points,
            first + k,
            Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()),
        );
    }
}

fn eye_band_point(eye: Point2<f32>, eye_width: f32, face_height: f32, t: f32) -> Point2<f32> {
    Point2::new(
        eye.x + (t - 0.5) * 2.0 * eye_width,
        eye.y + 0.05 * face_height * (TAU * t).sin(),
    )
}
