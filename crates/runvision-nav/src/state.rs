use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    Idle,
    Walking,
    TurnLeft,
    TurnRight,
    Approaching,
    StepUp,
    Stopped,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavState::Idle => "idle",
            NavState::Walking => "walking",
            NavState::TurnLeft => "turn_left",
            NavState::TurnRight => "turn_right",
            NavState::Approaching => "approaching",
            NavState::StepUp => "step_up",
            NavState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
