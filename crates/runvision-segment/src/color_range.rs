use serde::{Deserialize, Serialize};
use std::fmt;

/// Course elements that get their own color range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The running track itself; always calibrated and tracked.
    Track,
    /// Marker placed before the step obstacle.
    StepMarker,
    /// Marker used for the swerve (slalom) challenge.
    SwerveMarker,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Track, Target::StepMarker, Target::SwerveMarker];

    pub fn name(self) -> &'static str {
        match self {
            Target::Track => "track",
            Target::StepMarker => "step",
            Target::SwerveMarker => "swerve",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 8-bit HSV triple, `H` in `[0, 180)`.
pub type HsvColor = [u8; 3];

/// Inclusive HSV box.
///
/// The reset state is inverted (`lower = 255`, `upper = 0`) so that it selects
/// nothing and the first calibration sample sets real bounds through
/// componentwise min/max.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: HsvColor,
    pub upper: HsvColor,
}

impl ColorRange {
    pub const EMPTY: ColorRange = ColorRange {
        lower: [255, 255, 255],
        upper: [0, 0, 0],
    };

    pub fn new(lower: HsvColor, upper: HsvColor) -> Self {
        Self { lower, upper }
    }

    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    /// True when some channel has `lower > upper`.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|c| self.lower[c] > self.upper[c])
    }

    pub fn contains(&self, hsv: HsvColor) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    /// Grow the box so it covers `mean ± threshold`, clipped to `0..=255`.
    ///
    /// Bounds never shrink.
    pub fn widen(&mut self, mean: [f64; 3], threshold: f64) {
        for c in 0..3 {
            let hi = (mean[c] + threshold).round().max(self.upper[c] as f64);
            let lo = (mean[c] - threshold).round().min(self.lower[c] as f64);
            self.upper[c] = hi.clamp(0.0, 255.0) as u8;
            self.lower[c] = lo.clamp(0.0, 255.0) as u8;
        }
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// The three calibrated ranges shared by calibration and the control loop.
///
/// Owned by the loop: mutated through `&mut` while calibrating, read through
/// `&` afterwards.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColorRangeStore {
    #[serde(default)]
    pub track: ColorRange,
    #[serde(default)]
    pub step_marker: ColorRange,
    #[serde(default)]
    pub swerve_marker: ColorRange,
}

impl ColorRangeStore {
    pub fn get(&self, target: Target) -> &ColorRange {
        match target {
            Target::Track => &self.track,
            Target::StepMarker => &self.step_marker,
            Target::SwerveMarker => &self.swerve_marker,
        }
    }

    pub fn get_mut(&mut self, target: Target) -> &mut ColorRange {
        match target {
            Target::Track => &mut self.track,
            Target::StepMarker => &mut self.step_marker,
            Target::SwerveMarker => &mut self.swerve_marker,
        }
    }

    pub fn reset(&mut self, target: Target) {
        self.get_mut(target).reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_is_empty_everywhere() {
        let store = ColorRangeStore::default();
        for t in Target::ALL {
            assert_eq!(*store.get(t), ColorRange::EMPTY);
            assert!(store.get(t).is_empty());
        }
    }

    #[test]
    fn first_widen_from_empty_sets_tight_bounds() {
        let mut r = ColorRange::EMPTY;
        r.widen([100.0, 150.0, 200.0], 10.0);
        assert_eq!(r.lower, [90, 140, 190]);
        assert_eq!(r.upper, [110, 160, 210]);
        assert!(r.contains([100, 150, 200]));
        assert!(!r.contains([111, 150, 200]));
    }

    #[test]
    fn widen_clips_to_byte_range() {
        let mut r = ColorRange::EMPTY;
        r.widen([3.0, 250.0, 128.0], 10.0);
        assert_eq!(r.lower, [0, 240, 118]);
        assert_eq!(r.upper, [13, 255, 138]);
    }

    #[test]
    fn widen_never_shrinks() {
        let mut r = ColorRange::new([50, 50, 50], [70, 70, 70]);
        r.widen([60.0, 60.0, 60.0], 2.0);
        assert_eq!(r, ColorRange::new([50, 50, 50], [70, 70, 70]));
        r.widen([80.0, 40.0, 60.0], 5.0);
        assert_eq!(r.lower, [50, 35, 50]);
        assert_eq!(r.upper, [85, 70, 70]);
    }

    #[test]
    fn reset_only_touches_one_target() {
        let mut store = ColorRangeStore::default();
        store.track = ColorRange::new([1, 2, 3], [4, 5, 6]);
        store.step_marker = ColorRange::new([1, 2, 3], [4, 5, 6]);
        store.reset(Target::Track);
        assert_eq!(store.track, ColorRange::EMPTY);
        assert_eq!(store.step_marker, ColorRange::new([1, 2, 3], [4, 5, 6]));
    }

    #[test]
    fn store_serializes_with_snake_case_keys() {
        let store = ColorRangeStore::default();
        let json = serde_json::to_string(&store).expect("json");
        assert!(json.contains("\"step_marker\""));
        let back: ColorRangeStore = serde_json::from_str("{}").expect("parse");
        assert_eq!(back, store);
    }
}
