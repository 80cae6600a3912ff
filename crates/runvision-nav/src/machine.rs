use crate::command::{ActuatorCommand, HeadCommand};
use crate::observation::Observation;
use crate::params::{Challenges, NavParams, SteeringMode, SwerveSteering};
use crate::state::NavState;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What a single cycle asks of the actuators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NavOutput {
    /// State after this cycle.
    pub state: NavState,
    pub command: ActuatorCommand,
    /// Head repositioning requested on a transition, if any.
    pub head: Option<HeadCommand>,
}

/// Per-frame navigation state machine.
///
/// Holds the ramp value `X`, the smoothed step-marker row `mS` and the
/// step-macro cursor. Every call to [`step`](Self::step) yields exactly one
/// command to publish.
#[derive(Clone, Debug)]
pub struct NavigationStateMachine {
    params: NavParams,
    challenges: Challenges,
    state: NavState,
    ramp: f32,
    smoothed_step_row: f32,
    macro_stage: usize,
    macro_elapsed: u32,
}

impl NavigationStateMachine {
    pub fn new(params: NavParams, challenges: Challenges) -> Self {
        let ramp = params.ramp_initial;
        Self {
            params,
            challenges,
            state: NavState::Idle,
            ramp,
            smoothed_step_row: 0.0,
            macro_stage: 0,
            macro_elapsed: 0,
        }
    }

    pub fn params(&self) -> &NavParams {
        &self.params
    }

    pub fn challenges(&self) -> Challenges {
        self.challenges
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Current ramp value `X`.
    pub fn ramp(&self) -> f32 {
        self.ramp
    }

    /// Current smoothed step-marker row `mS`.
    pub fn smoothed_step_row(&self) -> f32 {
        self.smoothed_step_row
    }

    /// Return to Idle; the next cycle re-enters Walking with a fresh ramp.
    pub fn restart(&mut self) {
        self.transition(NavState::Idle, "restart");
        self.smoothed_step_row = 0.0;
        self.macro_stage = 0;
        self.macro_elapsed = 0;
    }

    /// Operator stop. Subsequent cycles publish stand until a restart.
    pub fn force_stop(&mut self) {
        self.transition(NavState::Stopped, "force stop");
    }

    /// Advance one cycle.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, obs), fields(state = %self.state))
    )]
    pub fn step(&mut self, obs: &Observation) -> NavOutput {
        let mut head = None;
        if self.state == NavState::Idle {
            self.enter_walking("start");
            head = Some(self.params.head.run());
        }

        let command = match self.state {
            NavState::Walking => self.walking(obs, &mut head),
            NavState::TurnLeft | NavState::TurnRight => self.turning(obs, &mut head),
            NavState::Approaching => self.approaching(obs),
            NavState::StepUp => self.step_up(&mut head),
            NavState::Stopped | NavState::Idle => ActuatorCommand::stand(&self.params.codes),
        };

        NavOutput {
            state: self.state,
            command,
            head,
        }
    }

    fn walking(&mut self, obs: &Observation, head: &mut Option<HeadCommand>) -> ActuatorCommand {
        let Some(track) = obs.track else {
            self.transition(NavState::Stopped, "track lost");
            return ActuatorCommand::stand(&self.params.codes);
        };
        let w = obs.frame_width as f32;
        let h = obs.frame_height as f32;

        if self.challenges.step {
            if let Some(marker) = obs.step_marker {
                if marker.y > h * self.params.approach_trigger_frac {
                    self.transition(NavState::Approaching, "step marker near");
                    self.smoothed_step_row = 0.0;
                    *head = Some(self.params.head.approach());
                    return self.creep(obs);
                }
            }
        }

        if self.params.steering == SteeringMode::Discrete {
            let offset = track.x - w / 2.0;
            if offset.abs() > self.params.turn_enter_offset * w {
                let (next, action) = if offset < 0.0 {
                    (NavState::TurnLeft, self.params.codes.turn_left)
                } else {
                    (NavState::TurnRight, self.params.codes.turn_right)
                };
                self.transition(next, "track off centre");
                return ActuatorCommand::action(action);
            }
        }

        self.ramp = (self.ramp - self.params.ramp_step).max(0.0);
        let turning = match self.params.steering {
            SteeringMode::Proportional => self.turning_toward(self.steering_target(obs, track.x), w),
            SteeringMode::Discrete => 0.0,
        };
        ActuatorCommand {
            action: self.params.codes.walk,
            forward: -self.ramp,
            lateral: 0.0,
            turning,
        }
    }

    fn turning(&mut self, obs: &Observation, head: &mut Option<HeadCommand>) -> ActuatorCommand {
        let Some(track) = obs.track else {
            self.transition(NavState::Stopped, "track lost");
            return ActuatorCommand::stand(&self.params.codes);
        };
        let w = obs.frame_width as f32;
        if (track.x - w / 2.0).abs() <= self.params.turn_exit_offset * w {
            self.transition(NavState::Walking, "track centred");
            return self.walking(obs, head);
        }
        let action = if self.state == NavState::TurnLeft {
            self.params.codes.turn_left
        } else {
            self.params.codes.turn_right
        };
        ActuatorCommand::action(action)
    }

    fn approaching(&mut self, obs: &Observation) -> ActuatorCommand {
        if let Some(marker) = obs.step_marker {
            if marker.y > 0.0 {
                let keep = self.params.smoothing_keep;
                self.smoothed_step_row = keep * self.smoothed_step_row + (1.0 - keep) * marker.y;
            }
        }
        log::debug!("approach: mS = {:.1}", self.smoothed_step_row);

        let h = obs.frame_height as f32;
        if self.smoothed_step_row > h * self.params.step_trigger_frac {
            self.transition(NavState::StepUp, "at step");
            self.macro_stage = 0;
            self.macro_elapsed = 0;
        }
        self.creep(obs)
    }

    fn step_up(&mut self, head: &mut Option<HeadCommand>) -> ActuatorCommand {
        let stages = &self.params.step_macro.stages;
        while self.macro_stage < stages.len() && stages[self.macro_stage].cycles == 0 {
            self.macro_stage += 1;
        }
        let Some(stage) = stages.get(self.macro_stage).copied() else {
            self.enter_walking("step done");
            *head = Some(self.params.head.run());
            return ActuatorCommand::stand(&self.params.codes);
        };

        self.macro_elapsed += 1;
        if self.macro_elapsed >= stage.cycles {
            self.macro_stage += 1;
            self.macro_elapsed = 0;
            let remaining = stages[self.macro_stage..].iter().any(|s| s.cycles > 0);
            if !remaining {
                self.enter_walking("step done");
                *head = Some(self.params.head.run());
            }
        }
        ActuatorCommand::action(stage.action)
    }

    fn creep(&self, obs: &Observation) -> ActuatorCommand {
        let turning = obs
            .track
            .map(|t| self.turning_toward(t.x, obs.frame_width as f32))
            .unwrap_or(0.0);
        ActuatorCommand {
            action: self.params.codes.creep,
            forward: self.params.creep_forward,
            lateral: 0.0,
            turning,
        }
    }

    /// Column to steer at: the track centroid, or the swerve heading when
    /// the swerve challenge is on and a heading was found.
    fn steering_target(&self, obs: &Observation, track_x: f32) -> f32 {
        match (self.challenges.swerve, obs.swerve_heading) {
            (true, Some(heading)) => match self.params.swerve_steering {
                SwerveSteering::Toward => heading,
                SwerveSteering::Away => obs.frame_width as f32 - heading,
            },
            _ => track_x,
        }
    }

    /// `gain * (W/2 - x) / (W/2)`: +gain at the left border, -gain at the right.
    fn turning_toward(&self, x: f32, width: f32) -> f32 {
        let half = width / 2.0;
        if half <= 0.0 {
            return 0.0;
        }
        self.params.steering_gain * (half - x) / half
    }

    fn enter_walking(&mut self, reason: &str) {
        self.ramp = self.params.ramp_initial;
        self.transition(NavState::Walking, reason);
    }

    fn transition(&mut self, next: NavState, reason: &str) {
        if self.state != next {
            log::info!("nav: {} -> {} ({reason})", self.state, next);
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MacroStage, StepMacro};
    use approx::assert_relative_eq;

    const W: usize = 640;
    const H: usize = 480;

    fn obs() -> Observation {
        Observation::blind(W, H)
    }

    fn walking_machine(challenges: Challenges) -> NavigationStateMachine {
        let mut m = NavigationStateMachine::new(NavParams::default(), challenges);
        m.step(&obs().with_track(320.0, 400.0));
        assert_eq!(m.state(), NavState::Walking);
        m
    }

    #[test]
    fn idle_enters_walking_on_first_cycle_with_run_pose() {
        let mut m = NavigationStateMachine::new(NavParams::default(), Challenges::default());
        assert_eq!(m.state(), NavState::Idle);
        let out = m.step(&obs().with_track(320.0, 400.0));
        assert_eq!(out.state, NavState::Walking);
        assert_eq!(out.command.action, 21);
        assert_relative_eq!(out.command.forward, -19.0);
        assert_eq!(
            out.head,
            Some(HeadCommand {
                channel: 20,
                speed: 30,
                position: 750
            })
        );
    }

    #[test]
    fn turning_is_plus_minus_gain_at_borders_and_zero_in_centre() {
        let mut m = walking_machine(Challenges::default());
        let left = m.step(&obs().with_track(0.0, 300.0));
        assert_relative_eq!(left.command.turning, 60.0);
        let right = m.step(&obs().with_track(640.0, 300.0));
        assert_relative_eq!(right.command.turning, -60.0);
        let centre = m.step(&obs().with_track(320.0, 300.0));
        assert_relative_eq!(centre.command.turning, 0.0);
        assert_eq!(centre.command.lateral, 0.0);
    }

    #[test]
    fn ramp_decreases_to_zero_and_stays() {
        let mut m = walking_machine(Challenges::default());
        for _ in 0..40 {
            let out = m.step(&obs().with_track(320.0, 300.0));
            assert!(out.command.forward <= 0.0);
        }
        assert_eq!(m.ramp(), 0.0);
        let out = m.step(&obs().with_track(320.0, 300.0));
        assert_eq!(out.command.forward, 0.0);
    }

    #[test]
    fn lost_track_stops_even_with_step_marker_present() {
        let mut m = walking_machine(Challenges {
            step: true,
            swerve: false,
        });
        let out = m.step(&obs().with_step_marker(320.0, 470.0));
        assert_eq!(out.state, NavState::Stopped);
        assert_eq!(out.command, ActuatorCommand::stand(&m.params().codes));

        // Stopped is sticky.
        let out = m.step(&obs().with_track(320.0, 300.0));
        assert_eq!(out.state, NavState::Stopped);
        assert_eq!(out.command.action, 0);
    }

    #[test]
    fn step_marker_ignored_without_step_challenge() {
        let mut m = walking_machine(Challenges::default());
        let out = m.step(&obs().with_track(320.0, 300.0).with_step_marker(320.0, 470.0));
        assert_eq!(out.state, NavState::Walking);
    }

    #[test]
    fn step_marker_in_upper_half_does_not_trigger_approach() {
        let mut m = walking_machine(Challenges {
            step: true,
            swerve: false,
        });
        let out = m.step(&obs().with_track(320.0, 300.0).with_step_marker(320.0, 240.0));
        assert_eq!(out.state, NavState::Walking);
    }

    #[test]
    fn approach_smooths_marker_row_and_ignores_missing_readings() {
        let mut m = walking_machine(Challenges {
            step: true,
            swerve: false,
        });
        let out = m.step(&obs().with_track(320.0, 300.0).with_step_marker(320.0, 250.0));
        assert_eq!(out.state, NavState::Approaching);
        assert_eq!(out.command.action, m.params().codes.creep);
        assert_eq!(out.head.map(|h| h.position), Some(680));
        assert_eq!(m.smoothed_step_row(), 0.0);

        m.step(&obs().with_step_marker(320.0, 100.0));
        assert_relative_eq!(m.smoothed_step_row(), 35.0, epsilon = 1e-4);

        // Missing reading and track loss leave the approach untouched.
        let out = m.step(&obs());
        assert_eq!(out.state, NavState::Approaching);
        assert_relative_eq!(m.smoothed_step_row(), 35.0, epsilon = 1e-4);
    }

    #[test]
    fn crossing_step_threshold_leads_to_step_up() {
        let mut m = walking_machine(Challenges {
            step: true,
            swerve: false,
        });
        m.step(&obs().with_track(320.0, 300.0).with_step_marker(320.0, 300.0));
        assert_eq!(m.state(), NavState::Approaching);

        let threshold = 0.6 * H as f32;
        let mut crossed = false;
        for _ in 0..30 {
            let out = m.step(&obs().with_step_marker(320.0, 470.0));
            if m.smoothed_step_row() > threshold {
                assert_eq!(out.state, NavState::StepUp);
                crossed = true;
                break;
            }
            assert_eq!(out.state, NavState::Approaching);
        }
        assert!(crossed);

        // Next cycle runs the macro whatever vision reports.
        let out = m.step(&obs().with_step_marker(320.0, 10.0));
        assert_eq!(out.state, NavState::StepUp);
        assert_eq!(out.command.action, m.params().codes.step_start);
    }

    #[test]
    fn step_macro_runs_stages_then_resumes_walking() {
        let params = NavParams {
            step_macro: StepMacro {
                stages: vec![
                    MacroStage {
                        action: 30,
                        cycles: 2,
                    },
                    MacroStage {
                        action: 99,
                        cycles: 0,
                    },
                    MacroStage {
                        action: 32,
                        cycles: 1,
                    },
                ],
            },
            ..NavParams::default()
        };
        let mut m = NavigationStateMachine::new(
            params,
            Challenges {
                step: true,
                swerve: false,
            },
        );
        m.step(&obs().with_track(320.0, 300.0).with_step_marker(320.0, 479.0));
        while m.state() == NavState::Approaching {
            m.step(&obs().with_step_marker(320.0, 479.0));
        }
        assert_eq!(m.state(), NavState::StepUp);

        let actions: Vec<i32> = (0..3).map(|_| m.step(&obs()).command.action).collect();
        assert_eq!(actions, vec![30, 30, 32]);
        assert_eq!(m.state(), NavState::Walking);
        assert_eq!(m.ramp(), 20.0);
    }

    #[test]
    fn swerve_heading_steers_away_by_default() {
        let mut m = walking_machine(Challenges {
            step: false,
            swerve: true,
        });
        // Heading on the left; mirrored target on the right turns right.
        let out = m.step(&obs().with_track(320.0, 300.0).with_swerve_heading(160.0));
        assert_relative_eq!(out.command.turning, -30.0);
        // No heading falls back to the track centroid.
        let out = m.step(&obs().with_track(320.0, 300.0));
        assert_relative_eq!(out.command.turning, 0.0);
    }

    #[test]
    fn swerve_heading_toward() {
        let params = NavParams {
            swerve_steering: SwerveSteering::Toward,
            ..NavParams::default()
        };
        let mut m = NavigationStateMachine::new(
            params,
            Challenges {
                step: false,
                swerve: true,
            },
        );
        let out = m.step(&obs().with_track(320.0, 300.0).with_swerve_heading(160.0));
        assert_relative_eq!(out.command.turning, 30.0);
    }

    #[test]
    fn discrete_turns_hold_until_recentred() {
        let params = NavParams {
            steering: SteeringMode::Discrete,
            ..NavParams::default()
        };
        let mut m = NavigationStateMachine::new(params, Challenges::default());
        let out = m.step(&obs().with_track(100.0, 300.0));
        assert_eq!(out.state, NavState::TurnLeft);
        assert_eq!(out.command.action, m.params().codes.turn_left);

        // Inside the central half but outside the central third: still turning.
        let out = m.step(&obs().with_track(200.0, 300.0));
        assert_eq!(out.state, NavState::TurnLeft);
        assert_eq!(out.command.action, m.params().codes.turn_left);

        let out = m.step(&obs().with_track(300.0, 300.0));
        assert_eq!(out.state, NavState::Walking);
        assert_eq!(out.command.action, m.params().codes.walk);
        assert_eq!(out.command.turning, 0.0);

        let out = m.step(&obs().with_track(600.0, 300.0));
        assert_eq!(out.state, NavState::TurnRight);
        let out = m.step(&obs());
        assert_eq!(out.state, NavState::Stopped);
    }

    #[test]
    fn discrete_turn_starts_outside_central_third() {
        let params = NavParams {
            steering: SteeringMode::Discrete,
            ..NavParams::default()
        };
        let mut m = NavigationStateMachine::new(params, Challenges::default());
        let out = m.step(&obs().with_track(320.0, 300.0));
        assert_eq!(out.state, NavState::Walking);

        // 0.2 * W left of centre: outside W/6, inside W/4.
        let x = 0.5 * W as f32 - 0.2 * W as f32;
        let states: Vec<NavState> = (0..5)
            .map(|_| m.step(&obs().with_track(x, 300.0)).state)
            .collect();
        assert_eq!(states, vec![NavState::TurnLeft; 5]);

        let out = m.step(&obs().with_track(W as f32 - x, 300.0));
        assert_eq!(out.state, NavState::TurnRight);
        assert_eq!(out.command.action, m.params().codes.turn_right);

        // Just inside the central third walks again.
        let out = m.step(&obs().with_track(320.0 + 100.0, 300.0));
        assert_eq!(out.state, NavState::Walking);
    }

    #[test]
    fn restart_and_force_stop() {
        let mut m = walking_machine(Challenges::default());
        m.force_stop();
        assert_eq!(m.step(&obs().with_track(320.0, 300.0)).state, NavState::Stopped);

        m.restart();
        assert_eq!(m.state(), NavState::Idle);
        let out = m.step(&obs().with_track(320.0, 300.0));
        assert_eq!(out.state, NavState::Walking);
        assert!(out.head.is_some());
        assert_relative_eq!(out.command.forward, -19.0);
    }
}
