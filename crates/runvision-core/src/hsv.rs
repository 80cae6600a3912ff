//! RGB -> HSV conversion in the 8-bit OpenCV convention.
//!
//! `H` is stored halved so it fits a byte (`0..180`), `S` and `V` span
//! `0..=255`. Calibrated ranges and thresholds assume this layout.

use crate::ColorImage;

/// Convert one RGB pixel to 8-bit HSV.
#[inline]
pub fn rgb_to_hsv_pixel([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h = if diff <= 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let h = (h * 0.5).round() as u32;

    [
        if h >= 180 { 0 } else { h as u8 },
        s.round().clamp(0.0, 255.0) as u8,
        v as u8,
    ]
}

/// Convert a whole RGB image to HSV.
pub fn rgb_to_hsv(src: &ColorImage) -> ColorImage {
    let mut data = Vec::with_capacity(src.data.len());
    for px in src.data.chunks_exact(3) {
        data.extend_from_slice(&rgb_to_hsv_pixel([px[0], px[1], px[2]]));
    }
    ColorImage {
        width: src.width,
        height: src.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_follow_halved_hue() {
        assert_eq!(rgb_to_hsv_pixel([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv_pixel([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv_pixel([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv_pixel([128, 128, 128]), [0, 0, 128]);
        assert_eq!(rgb_to_hsv_pixel([255, 255, 255]), [0, 0, 255]);
    }

    #[test]
    fn magenta_wraps_into_upper_hue_range() {
        // 300 degrees -> 150 in halved units.
        assert_eq!(rgb_to_hsv_pixel([255, 0, 255]), [150, 255, 255]);
    }

    #[test]
    fn image_conversion_is_per_pixel() {
        let mut img = ColorImage::new(2, 1);
        img.put_pixel(0, 0, [0, 255, 0]);
        img.put_pixel(1, 0, [255, 255, 255]);
        let hsv = rgb_to_hsv(&img);
        assert_eq!(hsv.pixel(0, 0), [60, 255, 255]);
        assert_eq!(hsv.pixel(1, 0), [0, 0, 255]);
    }
}
