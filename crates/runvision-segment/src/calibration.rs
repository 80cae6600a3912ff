//! Streaming calibration of HSV ranges from clicked sample points.
//!
//! Each click averages an `R x R` neighborhood of the HSV view with a
//! Gaussian falloff around the click, then widens the target's range to
//! cover `mean ± threshold`. Clicks on differently lit patches of the same
//! material only ever grow the box until the target is reset.

use crate::{ColorRange, ColorRangeStore, Frame, Target};
use nalgebra::Point2;
use runvision_core::ColorImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Calibration settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Side of the sampled neighborhood in pixels.
    pub radius: usize,
    /// Half-width added around the sampled mean on every channel.
    pub threshold: f64,
    /// Denominator of the Gaussian weight `exp(-d²/falloff)`, in squared pixels.
    pub falloff: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            radius: 10,
            threshold: 10.0,
            falloff: 18.0,
        }
    }
}

/// Weighted neighborhood mean around one click.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub point: Point2<i32>,
    pub mean: [f64; 3],
    /// Normalizer `N = Σw` over in-frame samples.
    pub weight: f64,
    /// Number of in-frame samples.
    pub count: usize,
}

/// Gaussian-weighted HSV mean around `point`.
///
/// Grid offsets `(i, j)` in `0..radius` map to `(x0 + i - radius/2,
/// y0 + j - radius/2)`. Samples outside the image are skipped. Returns `None`
/// when no sample lands inside (or the weights vanish).
pub fn sample_neighborhood(
    hsv: &ColorImageView<'_>,
    point: Point2<i32>,
    params: &CalibrationParams,
) -> Option<CalibrationSample> {
    let (x0, y0) = (point.x as i64, point.y as i64);
    let half = (params.radius / 2) as i64;

    let mut sums = [0f64; 3];
    let mut norm = 0f64;
    let mut count = 0usize;

    for i in 0..params.radius as i64 {
        for j in 0..params.radius as i64 {
            let ax = x0 + i - half;
            let ay = y0 + j - half;
            let Some(px) = hsv.get(ax, ay) else {
                continue;
            };
            let d2 = ((x0 - ax).pow(2) + (y0 - ay).pow(2)) as f64;
            let w = (-d2 / params.falloff).exp();
            for c in 0..3 {
                sums[c] += px[c] as f64 * w;
            }
            norm += w;
            count += 1;
        }
    }

    if count == 0 || norm <= 0.0 {
        return None;
    }

    Some(CalibrationSample {
        point,
        mean: sums.map(|s| s / norm),
        weight: norm,
        count,
    })
}

/// Widen `target`'s range in `store` from a click at `point`.
///
/// A click whose neighborhood lies entirely outside the frame leaves the
/// range untouched. Returns the range as stored after the call.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(store, target, frame, params), fields(target = %target))
)]
pub fn calibrate(
    store: &mut ColorRangeStore,
    target: Target,
    point: Point2<i32>,
    frame: &Frame,
    params: &CalibrationParams,
) -> ColorRange {
    let range = store.get_mut(target);
    match sample_neighborhood(&frame.hsv.view(), point, params) {
        Some(sample) => {
            range.widen(sample.mean, params.threshold);
            log::debug!(
                "calibrate {target} at ({}, {}): mean=({:.1}, {:.1}, {:.1}) -> {:?}..{:?}",
                point.x,
                point.y,
                sample.mean[0],
                sample.mean[1],
                sample.mean[2],
                range.lower,
                range.upper
            );
        }
        None => log::debug!(
            "calibrate {target} at ({}, {}): neighborhood outside frame",
            point.x,
            point.y
        ),
    }
    *range
}
