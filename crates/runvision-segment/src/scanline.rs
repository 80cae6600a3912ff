//! Scanline boundary scanner.
//!
//! The frame is split into vertical strips and one column per strip is
//! probed for the row where the mask turns from foreground (above) to
//! background (below). The probe is a binary search that assumes each column
//! is a single foreground run starting at the top edge; once the bracket is
//! narrower than `linear_window` rows it finishes with a linear scan.
//!
//! The heading is `Σ x_i·y_i / Σ y_i`: columns whose foreground reaches
//! further down the image (nearer the robot) pull the heading toward them.

use crate::{ColorRange, Frame};
use runvision_core::{in_range, GrayImageView, MASK_BACKGROUND};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Wire form of a missing heading.
pub const HEADING_SENTINEL: f32 = -1.0;

/// Scanner settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanlineParams {
    /// Number of equal strips (one probe column per strip).
    pub strips: usize,
    /// Bracket height below which the binary search switches to a linear scan.
    pub linear_window: usize,
    /// Check that the column really is one foreground run from the top edge
    /// down to the found boundary; if not, rescan it linearly.
    pub verify_monotone: bool,
}

impl Default for ScanlineParams {
    fn default() -> Self {
        Self {
            strips: 7,
            linear_window: 30,
            verify_monotone: false,
        }
    }
}

/// One probe column and the boundary row found on it (`0` if none).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScanColumn {
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub columns: Vec<ScanColumn>,
    /// Depth-weighted horizontal center, `None` when every `y_i` is zero.
    pub heading: Option<f32>,
}

/// Threshold `frame.hsv` with `range` and scan the resulting mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range, params), fields(width = frame.width(), height = frame.height()))
)]
pub fn scan(frame: &Frame, range: &ColorRange, params: &ScanlineParams) -> ScanResult {
    let mask = in_range(&frame.hsv.view(), range.lower, range.upper);
    scan_mask(&mask.view(), params)
}

/// Scan an existing mask.
pub fn scan_mask(mask: &GrayImageView<'_>, params: &ScanlineParams) -> ScanResult {
    let columns: Vec<ScanColumn> = column_positions(mask.width, params.strips)
        .map(|x| ScanColumn {
            x,
            y: boundary_row(mask, x, params),
        })
        .collect();

    let (s, n) = columns.iter().fold((0u64, 0u64), |(s, n), c| {
        (s + (c.x * c.y) as u64, n + c.y as u64)
    });
    let heading = (n > 0).then(|| s as f32 / n as f32);

    ScanResult { columns, heading }
}

/// Heading as published, `-1` when missing.
pub fn heading_sentinel(h: Option<f32>) -> f32 {
    h.unwrap_or(HEADING_SENTINEL)
}

/// Midpoints of `strips` equal strips: `i·dx + dx/2` with `dx = width / strips`.
fn column_positions(width: usize, strips: usize) -> impl Iterator<Item = usize> {
    let dx = if strips == 0 { 0 } else { width / strips };
    (0..strips).map(move |i| i * dx + dx / 2)
}

fn boundary_row(mask: &GrayImageView<'_>, x: usize, params: &ScanlineParams) -> usize {
    if mask.height == 0 || x >= mask.width {
        return 0;
    }
    let y = bisect_boundary(mask, x, params.linear_window.max(2));
    if params.verify_monotone && !is_top_run(mask, x, y) {
        return linear_boundary(mask, x);
    }
    y
}

#[inline]
fn is_fg(mask: &GrayImageView<'_>, x: usize, y: usize) -> bool {
    mask.at(x, y) != MASK_BACKGROUND
}

fn bisect_boundary(mask: &GrayImageView<'_>, x: usize, window: usize) -> usize {
    let mut up = 0usize;
    let mut down = mask.height - 1;
    loop {
        let p = (up + down) / 2;
        if is_fg(mask, x, p) {
            up = p;
        } else {
            down = p;
        }
        if down - up < window {
            return (up..down)
                .find(|&j| is_fg(mask, x, j) && !is_fg(mask, x, j + 1))
                .unwrap_or(0);
        }
    }
}

/// True when rows `0..=y` of column `x` are all foreground and `y + 1` is not.
fn is_top_run(mask: &GrayImageView<'_>, x: usize, y: usize) -> bool {
    if y == 0 {
        // Either a one-row run at the top or nothing found; both are fine
        // unless a longer top run exists.
        return !(is_fg(mask, x, 0) && mask.height > 1 && is_fg(mask, x, 1));
    }
    (0..=y).all(|j| is_fg(mask, x, j)) && (y + 1 >= mask.height || !is_fg(mask, x, y + 1))
}

/// End of the foreground run that starts at the top edge, `0` if there is none
/// or it covers the whole column.
fn linear_boundary(mask: &GrayImageView<'_>, x: usize) -> usize {
    if !is_fg(mask, x, 0) {
        return 0;
    }
    (0..mask.height - 1)
        .find(|&j| !is_fg(mask, x, j + 1))
        .unwrap_or(0)
}
