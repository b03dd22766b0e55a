//! Skin-tone alignment of the warped patch.

use henge_image::{Image, Mask};
use henge_utils::iter::zip_exact;

/// Multiplies the warped patch towards the source's chroma with half strength.
///
/// Per-channel means are taken over the confidently masked region (`mask > 127`), restricted
/// to pixels the warp actually wrote (alpha > 0); an identity warp yields unit gains. If the
/// masked or the written region is empty the patch is left untouched. This is deliberately
/// not a histogram match: a single gain per channel leaves texture intact.
pub fn correct_colors(warped: &mut Image, src: &Image, mask: &Mask) {
    let mut src_sum = [0u64; 3];
    let mut warped_sum = [0u64; 3];
    let mut masked = 0u64;
    let mut written = 0u64;

    let pixels = zip_exact(
        src.data().chunks_exact(4),
        warped.data().chunks_exact(4),
    );
    for (mask_value, (src_px, warped_px)) in zip_exact(mask.data(), pixels) {
        if *mask_value <= 127 {
            continue;
        }
        masked += 1;
        if warped_px[3] == 0 {
            continue;
        }
        written += 1;
        for c in 0..3 {
            src_sum[c] += src_px[c] as u64;
            warped_sum[c] += warped_px[c] as u64;
        }
    }
    if masked == 0 || written == 0 {
        log::trace!("color correction skipped: empty mask region");
        return;
    }

    let mut gain = [0f32; 3];
    for c in 0..3 {
        let src_mean = src_sum[c] as f32 / written as f32;
        let warped_mean = warped_sum[c] as f32 / written as f32;
        gain[c] = 1.0 + 0.5 * (src_mean - warped_mean) / warped_mean.max(1.0);
    }
    log::trace!("color gains: {gain:?}");

    for px in warped.data_mut().chunks_exact_mut(4) {
        for c in 0..3 {
            px[c] = (px[c] as f32 * gain[c]).round().clamp(0.0, 255.0) as u8;
        }
    }
}
