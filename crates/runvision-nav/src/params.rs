use crate::command::{ActionCodes, HeadCommand};
use serde::{Deserialize, Serialize};

/// How the track centroid is turned into a steering correction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringMode {
    /// Continuous turning proportional to the centroid offset.
    #[default]
    Proportional,
    /// Discrete turn states; the walk command goes straight.
    Discrete,
}

/// Whether the swerve heading is a direction to steer toward or away from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwerveSteering {
    Toward,
    /// Steer to the column mirrored about the image centre.
    #[default]
    Away,
}

/// Course challenges enabled for this run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Challenges {
    pub step: bool,
    pub swerve: bool,
}

/// Head servo channel, speed and the tilt poses used across a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadPoses {
    pub channel: u8,
    pub speed: u16,
    /// Neutral pan position.
    pub pan_center: u16,
    pub calibration_tilt: u16,
    pub run_tilt: u16,
    /// Tilt used while approaching the step so the marker stays in view.
    pub approach_tilt: u16,
}

impl Default for HeadPoses {
    fn default() -> Self {
        Self {
            channel: 20,
            speed: 30,
            pan_center: 507,
            calibration_tilt: 750,
            run_tilt: 750,
            approach_tilt: 680,
        }
    }
}

impl HeadPoses {
    pub fn command(&self, position: u16) -> HeadCommand {
        HeadCommand {
            channel: self.channel,
            speed: self.speed,
            position,
        }
    }

    pub fn calibration(&self) -> HeadCommand {
        self.command(self.calibration_tilt)
    }

    pub fn run(&self) -> HeadCommand {
        self.command(self.run_tilt)
    }

    pub fn approach(&self) -> HeadCommand {
        self.command(self.approach_tilt)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MacroStage {
    pub action: i32,
    /// Number of cycles the action is held; zero-length stages are skipped.
    pub cycles: u32,
}

/// Fixed action sequence executed while climbing the step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepMacro {
    pub stages: Vec<MacroStage>,
}

impl StepMacro {
    /// Climb, settle, then resume stance using the given codes.
    pub fn from_codes(codes: &ActionCodes) -> Self {
        Self {
            stages: vec![
                MacroStage {
                    action: codes.step_start,
                    cycles: 1,
                },
                MacroStage {
                    action: codes.step_continue,
                    cycles: 40,
                },
                MacroStage {
                    action: codes.stand,
                    cycles: 15,
                },
                MacroStage {
                    action: codes.step_end,
                    cycles: 5,
                },
            ],
        }
    }

    pub fn total_cycles(&self) -> u32 {
        self.stages.iter().map(|s| s.cycles).sum()
    }
}

impl Default for StepMacro {
    fn default() -> Self {
        Self::from_codes(&ActionCodes::default())
    }
}

/// Tunables of the navigation state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavParams {
    /// Ramp value X on entering Walking; forward speed is `-X`.
    pub ramp_initial: f32,
    /// Decrement of X per Walking cycle, floored at zero.
    pub ramp_step: f32,
    /// Turning output when the target sits on the image border.
    pub steering_gain: f32,
    pub steering: SteeringMode,
    /// Discrete mode: enter a turn state once `|cx - W/2| > enter * W`
    /// (outside the central third by default).
    pub turn_enter_offset: f32,
    /// Discrete mode: hand back to walking once `|cx - W/2| <= exit * W`
    /// (inside the central half by default). Walking re-enters the turn in
    /// the same cycle while the centroid is still outside the enter band.
    pub turn_exit_offset: f32,
    pub swerve_steering: SwerveSteering,
    /// Step marker below `frac * H` starts the approach.
    pub approach_trigger_frac: f32,
    /// Weight of the previous smoothed row in the step-marker filter.
    pub smoothing_keep: f32,
    /// Smoothed marker row above `frac * H` starts the climb.
    pub step_trigger_frac: f32,
    /// Forward value published with the creep action.
    pub creep_forward: f32,
    pub codes: ActionCodes,
    pub head: HeadPoses,
    pub step_macro: StepMacro,
}

impl Default for NavParams {
    fn default() -> Self {
        let codes = ActionCodes::default();
        Self {
            ramp_initial: 20.0,
            ramp_step: 1.0,
            steering_gain: 60.0,
            steering: SteeringMode::Proportional,
            turn_enter_offset: 1.0 / 6.0,
            turn_exit_offset: 0.25,
            swerve_steering: SwerveSteering::Away,
            approach_trigger_frac: 0.5,
            smoothing_keep: 0.65,
            step_trigger_frac: 0.6,
            creep_forward: 0.0,
            step_macro: StepMacro::from_codes(&codes),
            codes,
            head: HeadPoses::default(),
        }
    }
}
