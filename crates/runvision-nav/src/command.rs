use serde::{Deserialize, Serialize};

/// Opaque action codes understood by the downstream motion controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCodes {
    pub stand: i32,
    pub walk: i32,
    pub creep: i32,
    pub turn_left: i32,
    pub turn_right: i32,
    pub step_start: i32,
    pub step_continue: i32,
    pub step_end: i32,
}

impl Default for ActionCodes {
    fn default() -> Self {
        Self {
            stand: 0,
            walk: 21,
            creep: 11,
            turn_left: 2,
            turn_right: 3,
            step_start: 30,
            step_continue: 31,
            step_end: 32,
        }
    }
}

/// One cycle's locomotion intent. Each publish supersedes the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub action: i32,
    pub forward: f32,
    pub lateral: f32,
    pub turning: f32,
}

impl ActuatorCommand {
    /// Discrete action with all correction channels zeroed.
    pub fn action(action: i32) -> Self {
        Self {
            action,
            forward: 0.0,
            lateral: 0.0,
            turning: 0.0,
        }
    }

    pub fn stand(codes: &ActionCodes) -> Self {
        Self::action(codes.stand)
    }
}

/// Head servo target: `setPosition(channel, speed, position)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeadCommand {
    pub channel: u8,
    pub speed: u16,
    pub position: u16,
}
