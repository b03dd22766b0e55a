//! Engine error kinds.

use henge_image::Resolution;

/// Errors produced by the morphing engine.
///
/// Every variant except [`DimensionMismatch`](Self::DimensionMismatch) is recoverable: the
/// orchestrator copies the source image into the output buffer before signalling, so callers
/// may display the result either way.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A landmark array has fewer valid entries than a full face set requires.
    #[error("landmark array has {0} valid entries, at least 400 required")]
    InsufficientLandmarks(usize),

    /// Triangulation produced no usable triangles.
    #[error("triangulation of the landmark set produced no usable triangles")]
    DegenerateMesh,

    /// Fewer than 3 valid hull points were available to build the face mask.
    #[error("face mask construction failed: fewer than 3 valid hull points")]
    MaskConstructionFailed,

    /// The output buffer does not match the source image dimensions. Nothing was written.
    #[error("output buffer is {out}, source image is {src}")]
    DimensionMismatch { src: Resolution, out: Resolution },

    /// A landmark required to place an overlay is absent.
    #[error("overlay anchor landmark {0} is absent")]
    OverlayAnchorMissing(usize),

    /// A landmark file did not contain the expected JSON structure.
    #[error("malformed landmark JSON")]
    LandmarkJson(#[from] serde_json::Error),
}
