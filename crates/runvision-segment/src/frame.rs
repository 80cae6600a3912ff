use runvision_core::{median_blur, rgb_to_hsv, ColorImage};
use serde::{Deserialize, Serialize};

/// Preprocessing applied once per captured frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Median blur kernel size (odd). `1` disables blurring.
    pub blur_ksize: usize,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self { blur_ksize: 51 }
    }
}

/// One captured frame with its derived views.
///
/// Immutable once built; the loop replaces it every cycle.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgb: ColorImage,
    pub blurred: ColorImage,
    pub hsv: ColorImage,
}

impl Frame {
    pub fn from_rgb(rgb: ColorImage, params: &PreprocessParams) -> Self {
        let blurred = median_blur(&rgb, params.blur_ksize);
        let hsv = rgb_to_hsv(&blurred);
        Self { rgb, blurred, hsv }
    }

    pub fn width(&self) -> usize {
        self.rgb.width
    }

    pub fn height(&self) -> usize {
        self.rgb.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_views_match_source_size() {
        let rgb = ColorImage::filled(12, 8, [255, 0, 0]);
        let frame = Frame::from_rgb(rgb, &PreprocessParams { blur_ksize: 5 });
        assert_eq!((frame.width(), frame.height()), (12, 8));
        assert_eq!(frame.hsv.width, 12);
        assert_eq!(frame.hsv.pixel(3, 3), [0, 255, 255]);
    }
}
