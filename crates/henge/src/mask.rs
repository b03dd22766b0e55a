//! Feathered face-hull mask and mouth-interior mask.

use nalgebra::Point2;

use henge_image::Mask;

use crate::landmark::{LandmarkIdx, Landmarks, FACE_HULL, INNER_LIPS};
use crate::Error;

/// Blur radii of the feathering passes, applied in order.
///
/// The stack approximates a wide Gaussian: response falls off monotonically from the hull
/// outward with a transition band of roughly a hundred pixels on a 720p frame.
pub const FEATHER_RADII: [u32; 5] = [60, 50, 40, 25, 10];

/// The hull polygon is pulled towards its centroid by this factor before rasterization, so
/// the feather starts slightly inside the detected contour.
const HULL_EROSION: f32 = 0.98;

/// Mouth-openness values below this leave the mouth mask absent.
const MOUTH_OPEN_THRESHOLD: f32 = 0.15;

/// Anti-aliasing blur radius for the inner-lip polygon.
const MOUTH_BLUR_RADIUS: u32 = 3;

/// Builds the feathered face mask from the source landmarks.
///
/// The 36-point hull walk is gathered (absent landmarks are skipped), eroded towards the
/// centroid, rasterized, and blurred with each radius in `feather_radii`. Fails with
/// [`Error::MaskConstructionFailed`] when fewer than 3 hull points are present.
pub fn hull_mask(
    landmarks: &Landmarks,
    width: u32,
    height: u32,
    feather_radii: &[u32],
) -> Result<Mask, Error> {
    let hull: Vec<Point2<f32>> = FACE_HULL
        .iter()
        .filter_map(|&index| landmarks.get(index))
        .collect();
    if hull.len() < 3 {
        return Err(Error::MaskConstructionFailed);
    }

    let centroid = hull
        .iter()
        .fold(Point2::origin(), |acc: Point2<f32>, p| acc + p.coords)
        / hull.len() as f32;
    let eroded: Vec<Point2<f32>> = hull
        .iter()
        .map(|p| centroid + (p - centroid) * HULL_EROSION)
        .collect();

    let mut mask = Mask::new(width, height);
    mask.fill_polygon(&eroded, 255);
    for &radius in feather_radii {
        mask.box_blur(radius);
    }
    Ok(mask)
}

/// How far the mouth is open, in `0..=1`.
///
/// Zero when any of the four inner-lip reference landmarks is absent.
pub fn mouth_openness(landmarks: &Landmarks) -> f32 {
    let (Some(top), Some(bottom), Some(left), Some(right)) = (
        landmarks.get(LandmarkIdx::InnerLipsTop.into()),
        landmarks.get(LandmarkIdx::InnerLipsBottom.into()),
        landmarks.get(LandmarkIdx::InnerLipsLeftCorner.into()),
        landmarks.get(LandmarkIdx::InnerLipsRightCorner.into()),
    ) else {
        return 0.0;
    };

    let ratio = (bottom.y - top.y).abs() / (right.x - left.x).abs().max(1.0);
    ((ratio - 0.08) / 0.25).clamp(0.0, 1.0)
}

/// Builds the mouth-interior mask used to restore the source's teeth pixels.
///
/// Returns `None` when the mouth is (nearly) closed or the inner-lip polygon degenerates;
/// otherwise an anti-aliased polygon mask scaled by the openness.
pub fn mouth_mask(landmarks: &Landmarks, width: u32, height: u32) -> Option<Mask> {
    let openness = mouth_openness(landmarks);
    if openness < MOUTH_OPEN_THRESHOLD {
        return None;
    }

    let polygon: Vec<Point2<f32>> = INNER_LIPS
        .iter()
        .filter_map(|&index| landmarks.get(index))
        .collect();
    if polygon.len() < 3 {
        return None;
    }

    let mut mask = Mask::new(width, height);
    mask.fill_polygon(&polygon, 255);
    mask.box_blur(MOUTH_BLUR_RADIUS);
    mask.scale((1.5 * openness).min(1.0));
    Some(mask)
}
