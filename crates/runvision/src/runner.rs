//! The control loop: capture, segment, decide, publish, poll input.

use crate::calibrate::{CalibrationOutcome, CalibrationSession};
use crate::config::RunConfig;
use crate::error::{FrameError, RunError};
use crate::input::{Command, InputSource};
use crate::overlay::{Overlay, OverlaySink, CENTROID_COLOR, MARKER_COLOR};
use crate::sink::{ActuatorSink, HeadActuator};
use crate::source::FrameSource;
use runvision_core::ColorImage;
use runvision_nav::{ActuatorCommand, NavState, NavigationStateMachine, Observation};
use runvision_segment::{
    centroid_sentinel, heading_sentinel, scan, track, ColorRangeStore, Frame, Target,
};
use serde::Serialize;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Operator pressed quit in the main loop.
    Quit,
    /// Operator quit during calibration; the main loop never started.
    CalibrationQuit,
    /// The frame source ran out.
    Exhausted,
    /// `max_cycles` reached.
    CycleLimit,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cycles that produced a command.
    pub cycles: u64,
    /// Cycles skipped because the capture failed.
    pub skipped: u64,
    pub final_state: NavState,
    pub exit: ExitReason,
    pub ranges: ColorRangeStore,
}

/// Owns the color ranges, the state machine and every adapter.
pub struct Runner<S, A, H, I> {
    config: RunConfig,
    store: ColorRangeStore,
    nav: NavigationStateMachine,
    source: S,
    actuators: A,
    head: H,
    input: I,
    overlay: Option<Box<dyn OverlaySink>>,
    calibrated: bool,
}

impl<S, A, H, I> Runner<S, A, H, I>
where
    S: FrameSource,
    A: ActuatorSink,
    H: HeadActuator,
    I: InputSource,
{
    pub fn new(config: RunConfig, source: S, actuators: A, head: H, input: I) -> Self {
        let nav = NavigationStateMachine::new(config.nav.clone(), config.challenges);
        Self {
            config,
            store: ColorRangeStore::default(),
            nav,
            source,
            actuators,
            head,
            input,
            overlay: None,
            calibrated: false,
        }
    }

    /// Start from previously calibrated ranges.
    pub fn with_ranges(mut self, store: ColorRangeStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_overlay(mut self, overlay: Box<dyn OverlaySink>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> &ColorRangeStore {
        &self.store
    }

    pub fn nav(&self) -> &NavigationStateMachine {
        &self.nav
    }

    pub fn into_parts(self) -> (S, A, H, I) {
        (self.source, self.actuators, self.head, self.input)
    }

    /// Stand, point the head for calibration, run the phases, then point the
    /// head for running.
    pub fn calibrate(&mut self) -> Result<CalibrationOutcome, RunError> {
        let codes = self.config.nav.codes;
        let poses = self.config.nav.head;
        self.actuators.publish(&ActuatorCommand::stand(&codes))?;
        self.head.set_position(&poses.calibration())?;

        let outcome = CalibrationSession::new(&self.config).run(
            &mut self.store,
            &mut self.source,
            &mut self.input,
            self.overlay.as_deref_mut(),
        )?;
        if outcome == CalibrationOutcome::Completed {
            self.head.set_position(&poses.run())?;
            self.calibrated = true;
        }
        Ok(outcome)
    }

    /// Calibrate (unless configured not to or already done) and run the
    /// control loop until quit, source exhaustion or the cycle limit. A stand
    /// command is published on every exit path, errors included.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        let mut summary = RunSummary {
            cycles: 0,
            skipped: 0,
            final_state: self.nav.state(),
            exit: ExitReason::Quit,
            ranges: self.store,
        };
        let result = self.run_inner(&mut summary);

        let stand = ActuatorCommand::stand(&self.config.nav.codes);
        let stopped = self.actuators.publish(&stand);
        summary.final_state = self.nav.state();
        summary.ranges = self.store;

        match (result, stopped) {
            (Ok(()), Ok(())) => {
                log::info!(
                    "run finished ({:?}) after {} cycles, {} skipped, state {}",
                    summary.exit,
                    summary.cycles,
                    summary.skipped,
                    summary.final_state
                );
                Ok(summary)
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), stopped) => {
                if let Err(s) = stopped {
                    log::error!("could not publish stand after failure: {s}");
                }
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, summary: &mut RunSummary) -> Result<(), RunError> {
        if self.calibrated {
            log::debug!("ranges already calibrated");
        } else if self.config.skip_calibration {
            self.head.set_position(&self.config.nav.head.run())?;
        } else if self.calibrate()? == CalibrationOutcome::Quit {
            summary.exit = ExitReason::CalibrationQuit;
            return Ok(());
        }

        let timeout = self.config.input_timeout();
        loop {
            if let Some(max) = self.config.max_cycles {
                if summary.cycles + summary.skipped >= max {
                    summary.exit = ExitReason::CycleLimit;
                    return Ok(());
                }
            }

            match self.source.capture() {
                Ok(image) => {
                    self.cycle(image, summary.cycles)?;
                    summary.cycles += 1;
                }
                Err(FrameError::Exhausted) => {
                    summary.exit = ExitReason::Exhausted;
                    return Ok(());
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    log::warn!("cycle skipped: {e}");
                    summary.skipped += 1;
                }
            }

            if self.handle_input(timeout) {
                summary.exit = ExitReason::Quit;
                return Ok(());
            }
        }
    }

    fn cycle(&mut self, image: ColorImage, n: u64) -> Result<(), RunError> {
        let frame = Frame::from_rgb(image, &self.config.preprocess);
        let challenges = self.config.challenges;

        let track_c = track(&frame, self.store.get(Target::Track));
        let step_c = if challenges.step {
            track(&frame, self.store.get(Target::StepMarker))
        } else {
            None
        };
        let scanned = challenges
            .swerve
            .then(|| scan(&frame, self.store.get(Target::SwerveMarker), &self.config.scanline));
        let heading = scanned.as_ref().and_then(|s| s.heading);

        let (tx, ty) = centroid_sentinel(track_c);
        let (sx, sy) = centroid_sentinel(step_c);
        log::debug!(
            "cycle {n}: track=({tx}, {ty}) step=({sx}, {sy}) heading={:.1}",
            heading_sentinel(heading)
        );

        let obs = Observation {
            frame_width: frame.width(),
            frame_height: frame.height(),
            track: track_c,
            step_marker: step_c,
            swerve_heading: heading,
        };
        let out = self.nav.step(&obs);
        if let Some(head) = out.head {
            self.head.set_position(&head)?;
        }
        self.actuators.publish(&out.command)?;
        log::debug!(
            "cycle {n}: {} action={} forward={:.1} lateral={:.1} turning={:.1}",
            out.state,
            out.command.action,
            out.command.forward,
            out.command.lateral,
            out.command.turning
        );

        if let Some(overlay) = self.overlay.as_deref_mut() {
            let mut view = Overlay::painted_out(&frame, self.store.get(Target::Track))
                .centroid(track_c, CENTROID_COLOR);
            if challenges.step {
                view = view.centroid(step_c, MARKER_COLOR);
            }
            if let Some(s) = &scanned {
                view = view.scan(s);
            }
            overlay.show("Running", &view.finish())?;
        }
        Ok(())
    }

    /// Apply operator commands; true when the loop should quit.
    fn handle_input(&mut self, timeout: Duration) -> bool {
        let mut quit = false;
        for event in self.input.poll(timeout) {
            match event.command() {
                Some(Command::Quit) => {
                    log::info!("quit requested");
                    quit = true;
                }
                Some(Command::Restart) => self.nav.restart(),
                Some(Command::ForceStop) => self.nav.force_stop(),
                None => {}
            }
        }
        quit
    }
}
