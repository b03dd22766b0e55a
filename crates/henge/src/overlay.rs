//! Rigid 2-D overlay placement ("addons"): glasses, moustaches, hats.
//!
//! Overlays are sticker images drawn onto a frame at a pose derived from the landmarks. Only
//! a coarse 2-D head pose is estimated (roll from the eye axis, yaw from the cheek distance
//! imbalance), which is enough to keep stickers visually attached to the face.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use henge_image::{draw_sprite, Image};
use henge_utils::geom::Affine;

use crate::landmark::{LandmarkIdx, Landmarks};
use crate::Error;

/// Coarse 2-D head pose, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// In-plane rotation, from the left-eye → right-eye axis.
    pub roll: f32,
    /// Left/right head turn estimated from cheek-to-nose distances, in `-π/2..=π/2`.
    pub yaw: f32,
}

/// Estimates the head pose from eye-corner, nose, and cheek landmarks.
///
/// Returns `None` when the eye corners are absent. Missing nose or cheek landmarks leave the
/// yaw at zero rather than failing; roll is the part that matters for overlay placement.
pub fn head_pose(landmarks: &Landmarks) -> Option<HeadPose> {
    let left = landmarks.get(LandmarkIdx::LeftEyeOuterCorner.into())?;
    let right = landmarks.get(LandmarkIdx::RightEyeOuterCorner.into())?;
    let roll = (right.y - left.y).atan2(right.x - left.x);

    let yaw = match (
        landmarks.get(LandmarkIdx::NoseTip.into()),
        landmarks.get(LandmarkIdx::LeftCheek.into()),
        landmarks.get(LandmarkIdx::RightCheek.into()),
    ) {
        (Some(nose), Some(left_cheek), Some(right_cheek)) => {
            let to_left = (nose - left_cheek).norm();
            let to_right = (nose - right_cheek).norm();
            let total = to_left + to_right;
            if total > f32::EPSILON {
                (to_left - to_right) / total * std::f32::consts::FRAC_PI_2
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    Some(HeadPose { roll, yaw })
}

/// The supported overlay kinds. Each kind fixes the landmarks anchoring its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonKind {
    Glasses,
    Moustache,
    Hat,
    Generic,
}

struct Placement {
    center: Point2<f32>,
    width: f32,
    height: f32,
    /// The named kinds' sticker assets are stored upside down relative to canvas orientation;
    /// a final Y-flip keeps them compatible.
    flip_y: bool,
}

/// Draws `overlay` onto `canvas` at the pose and anchor points dictated by `kind`.
///
/// The overlay keeps its aspect ratio; its width is derived from landmark distances per kind.
/// Fails with [`Error::OverlayAnchorMissing`] when a required anchor landmark is absent.
pub fn place_overlay(
    canvas: &mut Image,
    overlay: &Image,
    kind: AddonKind,
    landmarks: &Landmarks,
) -> Result<(), Error> {
    if overlay.width() == 0 || overlay.height() == 0 {
        return Ok(());
    }
    let anchor = |idx: LandmarkIdx| {
        landmarks
            .get(idx.into())
            .ok_or(Error::OverlayAnchorMissing(idx.into()))
    };
    let aspect = overlay.height() as f32 / overlay.width() as f32;

    let placement = match kind {
        AddonKind::Glasses => {
            let left = anchor(LandmarkIdx::LeftEyeOuterCorner)?;
            let right = anchor(LandmarkIdx::RightEyeOuterCorner)?;
            let width = 2.2 * (right - left).norm();
            Placement {
                center: left + (right - left) * 0.5,
                width,
                height: width * aspect,
                flip_y: true,
            }
        }
        AddonKind::Moustache => {
            let left = anchor(LandmarkIdx::MouthCornerLeft)?;
            let right = anchor(LandmarkIdx::MouthCornerRight)?;
            let width = 1.8 * (right - left).norm();
            let height = width * aspect;
            Placement {
                center: left + (right - left) * 0.5 - Vector2::new(0.0, 0.3 * height),
                width,
                height,
                flip_y: true,
            }
        }
        AddonKind::Hat => {
            let forehead = anchor(LandmarkIdx::Forehead)?;
            let left = anchor(LandmarkIdx::LeftCheek)?;
            let right = anchor(LandmarkIdx::RightCheek)?;
            let width = 1.8 * (right - left).norm();
            let height = width * aspect;
            Placement {
                center: Point2::new((left.x + right.x) * 0.5, forehead.y - 0.2 * height),
                width,
                height,
                flip_y: true,
            }
        }
        AddonKind::Generic => {
            let left = anchor(LandmarkIdx::LeftCheek)?;
            let right = anchor(LandmarkIdx::RightCheek)?;
            let width = (right - left).norm();
            Placement {
                center: left + (right - left) * 0.5,
                width,
                height: width * aspect,
                flip_y: false,
            }
        }
    };

    let pose = head_pose(landmarks).unwrap_or(HeadPose { roll: 0.0, yaw: 0.0 });

    // Sprite pixels are centered and sized, optionally flipped, squeezed for yaw, rotated
    // by roll, and moved to the anchor position. Inner transforms apply first.
    let mut transform = Affine::translation(
        -(overlay.width() as f32) / 2.0,
        -(overlay.height() as f32) / 2.0,
    )
    .then(&Affine::scale(
        placement.width / overlay.width() as f32,
        placement.height / overlay.height() as f32,
    ));
    if placement.flip_y {
        transform = transform.then(&Affine::scale(1.0, -1.0));
    }
    transform = transform
        .then(&Affine::scale(1.0 - 0.3 * pose.yaw.abs(), 1.0))
        .then(&Affine::rotation(pose.roll))
        .then(&Affine::translation(placement.center.x, placement.center.y));

    draw_sprite(canvas, overlay, &transform);
    Ok(())
}
