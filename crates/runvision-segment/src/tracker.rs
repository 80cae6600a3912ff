//! Largest-region centroid tracking.

use crate::{ColorRange, Frame};
use nalgebra::Point2;
use runvision_core::{in_range, largest_region, Region};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Wire form of a missing centroid.
pub const CENTROID_SENTINEL: (i32, i32) = (-1, -1);

/// Largest 8-connected in-range region of `frame.hsv`, if any.
pub fn track_region(frame: &Frame, range: &ColorRange) -> Option<Region> {
    let mask = in_range(&frame.hsv.view(), range.lower, range.upper);
    largest_region(&mask.view())
}

/// Centroid `(M10/M00, M01/M00)` of the largest in-range region.
///
/// `None` when the mask is empty or the chosen region has zero area. No
/// temporal smoothing is applied.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range), fields(width = frame.width(), height = frame.height()))
)]
pub fn track(frame: &Frame, range: &ColorRange) -> Option<Point2<f32>> {
    track_region(frame, range)?.centroid()
}

/// Integer pixel form of a centroid, `(-1, -1)` when missing.
pub fn centroid_sentinel(c: Option<Point2<f32>>) -> (i32, i32) {
    c.map(|p| (p.x as i32, p.y as i32))
        .unwrap_or(CENTROID_SENTINEL)
}
