//! Conversions between `image` buffers and the in-house `ColorImage`.

use crate::error::{FrameError, SinkError};
use runvision_core::{ColorImage, ImageError};
use std::path::Path;

/// Copy an `image::RgbImage` into a `ColorImage`.
pub fn to_color_image(img: &::image::RgbImage) -> Result<ColorImage, ImageError> {
    ColorImage::from_raw(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}

/// Copy a `ColorImage` into an `image::RgbImage`.
pub fn to_rgb_image(img: &ColorImage) -> Result<::image::RgbImage, ImageError> {
    ::image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone()).ok_or(
        ImageError::InvalidBuffer {
            expected: img.width * img.height * 3,
            got: img.data.len(),
        },
    )
}

/// Decode any supported image file as RGB.
pub fn load_color_image(path: &Path) -> Result<ColorImage, FrameError> {
    let decoded = ::image::open(path).map_err(|e| FrameError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(to_color_image(&decoded.to_rgb8())?)
}

/// Encode `img` to `path`, optionally scaled with nearest-neighbour sampling.
pub fn save_color_image(img: &ColorImage, path: &Path, scale: f32) -> Result<(), SinkError> {
    let to_sink = |message: String| SinkError::Image {
        path: path.to_path_buf(),
        message,
    };
    let mut rgb = to_rgb_image(img).map_err(|e| to_sink(e.to_string()))?;
    if scale > 0.0 && (scale - 1.0).abs() > f32::EPSILON {
        let w = ((rgb.width() as f32 * scale).round() as u32).max(1);
        let h = ((rgb.height() as f32 * scale).round() as u32).max(1);
        rgb = ::image::imageops::resize(&rgb, w, h, ::image::imageops::FilterType::Nearest);
    }
    rgb.save(path).map_err(|e| to_sink(e.to_string()))
}
