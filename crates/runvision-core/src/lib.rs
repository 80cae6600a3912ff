//! Image buffers and segmentation primitives for `runvision`.
//!
//! This crate is intentionally small. It provides exactly the primitives the
//! course-running pipeline needs and nothing more:
//! - row-major 8-bit buffers (`GrayImage`, `ColorImage`) and borrowed views,
//! - per-channel median blur with replicated borders,
//! - RGB -> HSV conversion using the 8-bit OpenCV convention (`H in [0,180)`),
//! - inclusive in-range masking,
//! - 8-connected region extraction with first-order moments.
//!
//! It does *not* know about targets, calibration or navigation.

mod blur;
mod hsv;
mod image;
mod logger;
mod mask;
mod regions;

pub use blur::median_blur;
pub use hsv::{rgb_to_hsv, rgb_to_hsv_pixel};
pub use image::{ColorImage, ColorImageView, GrayImage, GrayImageView, ImageError};
pub use mask::{in_range, MASK_BACKGROUND, MASK_FOREGROUND};
pub use regions::{connected_components, largest_region, Region};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{filter_directives, init_with_level, level_for_target, parse_level};
