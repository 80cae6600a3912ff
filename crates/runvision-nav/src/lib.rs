//! Navigation state machine for the running course.
//!
//! One `NavigationStateMachine::step` per camera cycle: it consumes the
//! vision layer's `Observation` (track centroid, step-marker centroid, swerve
//! heading, each optional) and returns the `ActuatorCommand` to publish plus
//! an optional head repositioning.
//!
//! State graph:
//!
//! ```text
//! Idle -> Walking <-> {TurnLeft, TurnRight}
//!         Walking -> Approaching -> StepUp -> Walking
//! any -> Stopped (track lost / force stop); restart -> Idle
//! ```
//!
//! Which optional branches exist is decided by `Challenges` and
//! `SteeringMode`, so one machine covers the plain track run, the step
//! challenge and the swerve challenge.

mod command;
mod machine;
mod observation;
mod params;
mod state;

pub use command::{ActionCodes, ActuatorCommand, HeadCommand};
pub use machine::{NavOutput, NavigationStateMachine};
pub use observation::Observation;
pub use params::{
    Challenges, HeadPoses, MacroStage, NavParams, SteeringMode, StepMacro, SwerveSteering,
};
pub use state::NavState;
