//! Color segmentation for the running course.
//!
//! ## Quickstart
//!
//! ```
//! use runvision_core::ColorImage;
//! use runvision_segment::{
//!     calibrate, track, CalibrationParams, ColorRangeStore, Frame, PreprocessParams, Target,
//! };
//! use nalgebra::Point2;
//!
//! let rgb = ColorImage::filled(64, 48, [0, 200, 0]);
//! let frame = Frame::from_rgb(rgb, &PreprocessParams { blur_ksize: 1 });
//!
//! let mut store = ColorRangeStore::default();
//! calibrate(&mut store, Target::Track, Point2::new(32, 24), &frame, &CalibrationParams::default());
//!
//! let centroid = track(&frame, store.get(Target::Track));
//! assert!(centroid.is_some());
//! ```
//!
//! Pipeline pieces:
//! 1. `Frame::from_rgb` blurs and converts each capture to HSV once.
//! 2. `calibrate` widens a target's `ColorRange` from a clicked neighborhood.
//! 3. `track` thresholds, keeps the largest 8-connected region, returns its centroid.
//! 4. `scan` probes vertical columns for a boundary row and returns a
//!    depth-weighted horizontal heading.
//!
//! Misses are `None`; `centroid_sentinel` / `heading_sentinel` convert to the
//! `-1` wire convention at the publishing edge.

mod calibration;
mod color_range;
mod frame;
mod scanline;
mod tracker;

pub use calibration::{calibrate, sample_neighborhood, CalibrationParams, CalibrationSample};
pub use color_range::{ColorRange, ColorRangeStore, HsvColor, Target};
pub use frame::{Frame, PreprocessParams};
pub use scanline::{
    heading_sentinel, scan, scan_mask, ScanColumn, ScanResult, ScanlineParams, HEADING_SENTINEL,
};
pub use tracker::{centroid_sentinel, track, track_region, CENTROID_SENTINEL};
