//! Landmark sets and the fixed face-mesh index tables.
//!
//! Landmarks follow the 478-point face-mesh indexing (468 mesh points plus 10 iris points) and
//! are stored in the pixel space of the image they annotate. Entries can be *absent* (a
//! detector may fail to place a point, and landmark files may contain `null`s), and every
//! consumer in the pipeline skips absent entries instead of substituting a position.

use nalgebra::Point2;
use once_cell::sync::Lazy;

use crate::Error;

/// Minimum number of valid landmarks for a usable full face set.
pub const MIN_LANDMARKS: usize = 400;

/// Number of points in a complete face-mesh landmark set.
pub const FULL_LANDMARKS: usize = 478;

/// An ordered set of optional 2-D landmark positions.
#[derive(Debug, Clone)]
pub struct Landmarks {
    points: Vec<Option<Point2<f32>>>,
}

impl Landmarks {
    /// Creates a landmark set of `len` entries, all absent.
    pub fn new(len: usize) -> Self {
        Self {
            points: vec![None; len],
        }
    }

    /// Builds a landmark set from integer pixel pairs, as produced by the editor.
    pub fn from_pixel_pairs(pairs: &[[i32; 2]]) -> Self {
        Self {
            points: pairs
                .iter()
                .map(|&[x, y]| Some(Point2::new(x as f32, y as f32)))
                .collect(),
        }
    }

    /// Parses the landmark JSON format: a top-level array of two-element `[x, y]` arrays.
    ///
    /// `null` entries and entries with non-finite coordinates become absent landmarks. The
    /// entry count is *not* validated here; a short array is rejected by the morph call that
    /// consumes it.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, Error> {
        let raw: Vec<Option<[f64; 2]>> = serde_json::from_slice(data)?;
        let points = raw
            .into_iter()
            .map(|entry| match entry {
                Some([x, y]) if x.is_finite() && y.is_finite() => {
                    Some(Point2::new(x as f32, y as f32))
                }
                _ => None,
            })
            .collect();
        Ok(Self { points })
    }

    /// Number of entries, including absent ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of present entries.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Returns the landmark at `index`, or `None` when the entry is absent or out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Point2<f32>> {
        self.points.get(index).copied().flatten()
    }

    pub fn set(&mut self, index: usize, point: Point2<f32>) {
        if index >= self.points.len() {
            self.points.resize(index + 1, None);
        }
        self.points[index] = Some(point);
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(entry) = self.points.get_mut(index) {
            *entry = None;
        }
    }

    /// Returns a copy with every present landmark scaled by `(sx, sy)`.
    ///
    /// Used to bring target landmarks into source-image pixel space.
    pub fn scaled(&self, sx: f32, sy: f32) -> Landmarks {
        Landmarks {
            points: self
                .points
                .iter()
                .map(|p| p.map(|p| Point2::new(p.x * sx, p.y * sy)))
                .collect(),
        }
    }
}

/// Assigns a name to certain important landmark indices.
///
/// "Left" and "right" are relative to the input image, not from the PoV of the depicted person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    NoseTip = 1,
    Forehead = 10,
    InnerLipsTop = 13,
    InnerLipsBottom = 14,
    LeftEyeOuterCorner = 33,
    MouthCornerLeft = 61,
    InnerLipsLeftCorner = 78,
    Chin = 152,
    LeftCheek = 234,
    RightEyeOuterCorner = 263,
    MouthCornerRight = 291,
    InnerLipsRightCorner = 308,
    RightCheek = 454,
}

impl From<LandmarkIdx> for usize {
    #[inline]
    fn from(idx: LandmarkIdx) -> usize {
        idx as usize
    }
}

/// The 36 face-contour landmarks, in walk order around the face boundary.
pub const FACE_HULL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Inner-lip walk (20 indices), used by the mouth-interior mask.
pub const INNER_LIPS: [usize; 20] = [
    78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308, 415, 310, 311, 312, 13, 82, 81, 80, 191,
];

const LEFT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];
const RIGHT_EYE: [usize; 16] = [
    263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466,
];
const LEFT_EYEBROW: [usize; 10] = [46, 53, 52, 65, 55, 70, 63, 105, 66, 107];
const RIGHT_EYEBROW: [usize; 10] = [276, 283, 282, 295, 285, 300, 293, 334, 296, 336];
const OUTER_LIPS: [usize; 20] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185,
];
const NOSE: [usize; 20] = [
    1, 2, 4, 5, 6, 19, 48, 64, 94, 97, 98, 115, 168, 195, 197, 278, 294, 326, 327, 344,
];
const CHEEKS: [usize; 14] = [
    50, 101, 118, 123, 137, 177, 205, 280, 330, 347, 352, 366, 401, 425,
];
const FOREHEAD: [usize; 12] = [8, 9, 68, 69, 71, 104, 108, 151, 298, 299, 301, 333];
const IRISES: [usize; 10] = [468, 469, 470, 471, 472, 473, 474, 475, 476, 477];

/// Vertex set for the morph triangulation: a fixed, de-duplicated, sorted index list covering
/// contour, eyes, eyebrows, nose, inner/outer lips, cheeks, forehead, and irises.
pub static KEY_TRIANGULATION: Lazy<Vec<usize>> = Lazy::new(|| {
    let mut indices: Vec<usize> = FACE_HULL
        .iter()
        .chain(&INNER_LIPS)
        .chain(&LEFT_EYE)
        .chain(&RIGHT_EYE)
        .chain(&LEFT_EYEBROW)
        .chain(&RIGHT_EYEBROW)
        .chain(&OUTER_LIPS)
        .chain(&NOSE)
        .chain(&CHEEKS)
        .chain(&FOREHEAD)
        .chain(&IRISES)
        .copied()
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
});
