//! Range thresholding into binary masks.

use crate::{ColorImageView, GrayImage};

pub const MASK_FOREGROUND: u8 = 255;
pub const MASK_BACKGROUND: u8 = 0;

/// Mark every pixel whose channels all lie in `[lower, upper]` (inclusive).
///
/// A range with any `lower[c] > upper[c]` selects nothing, which is how an
/// uncalibrated range behaves.
pub fn in_range(src: &ColorImageView<'_>, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    let mut mask = GrayImage::new(src.width, src.height);
    if (0..3).any(|c| lower[c] > upper[c]) {
        return mask;
    }

    for (dst, px) in mask.data.iter_mut().zip(src.data.chunks_exact(3)) {
        let inside = (0..3).all(|c| px[c] >= lower[c] && px[c] <= upper[c]);
        *dst = if inside {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        };
    }
    mask
}
