//! henge is a real-time face-morphing engine.
//!
//! Given a source image annotated with facial landmarks, a target image with corresponding
//! landmarks, and a blend strength α, [`Morpher::morph`] warps the target's features onto the
//! source's face geometry and blends them in under a feathered face mask, preserving the
//! source's mouth interior. Rigid 2-D stickers (glasses, hats, moustaches) are placed with
//! [`overlay::place_overlay`], and the asset editor expands 8 hand-placed key points into a
//! full 478-point landmark set with [`interp::interpolate_478`].
//!
//! Landmarks use the 478-point face-mesh indexing, with coordinates in the pixel space of the
//! image they annotate. The engine consumes and produces pixel buffers only; landmark
//! detection, camera capture, and asset discovery live outside this crate.

pub mod catalog;
pub mod color;
pub mod delaunay;
mod error;
pub mod interp;
pub mod landmark;
pub mod mask;
pub mod morph;
pub mod overlay;
pub mod warp;

pub use error::Error;
pub use morph::Morpher;

pub use henge_image as image;
pub use henge_utils::{geom, iter, num, timer};
