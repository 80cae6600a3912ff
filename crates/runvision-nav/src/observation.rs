use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Vision outputs for one cycle. `None` means "not visible".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub frame_width: usize,
    pub frame_height: usize,
    pub track: Option<Point2<f32>>,
    pub step_marker: Option<Point2<f32>>,
    pub swerve_heading: Option<f32>,
}

impl Observation {
    /// Observation with nothing visible.
    pub fn blind(frame_width: usize, frame_height: usize) -> Self {
        Self {
            frame_width,
            frame_height,
            track: None,
            step_marker: None,
            swerve_heading: None,
        }
    }

    pub fn with_track(mut self, x: f32, y: f32) -> Self {
        self.track = Some(Point2::new(x, y));
        self
    }

    pub fn with_step_marker(mut self, x: f32, y: f32) -> Self {
        self.step_marker = Some(Point2::new(x, y));
        self
    }

    pub fn with_swerve_heading(mut self, heading: f32) -> Self {
        self.swerve_heading = Some(heading);
        self
    }
}
