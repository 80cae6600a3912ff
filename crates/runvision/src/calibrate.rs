//! Interactive calibration phases run before the control loop.

use crate::config::RunConfig;
use crate::error::{FrameError, RunError};
use crate::input::{CalibrationCommand, InputSource};
use crate::overlay::{Overlay, OverlaySink, CENTROID_COLOR, MARKER_COLOR};
use crate::source::FrameSource;
use nalgebra::Point2;
use runvision_segment::{calibrate, scan, track, ColorRangeStore, Frame, Target};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// Every phase was finished by the operator.
    Completed,
    /// The operator asked to quit the whole run.
    Quit,
}

/// Window title of the overlay shown while calibrating `target`.
pub fn window_title(target: Target) -> &'static str {
    match target {
        Target::Track => "Main Calibration",
        Target::StepMarker => "Step Calibration",
        Target::SwerveMarker => "Swerve Calibration",
    }
}

/// Runs the calibration phases configured by a [`RunConfig`].
///
/// Each phase captures a frame, then keeps clicking on that same frame for
/// `calibration_refresh - 1` further iterations before capturing again.
pub struct CalibrationSession<'a> {
    config: &'a RunConfig,
}

impl<'a> CalibrationSession<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn run<S, I, O>(
        &self,
        store: &mut ColorRangeStore,
        source: &mut S,
        input: &mut I,
        mut overlay: Option<&mut O>,
    ) -> Result<CalibrationOutcome, RunError>
    where
        S: FrameSource + ?Sized,
        I: InputSource + ?Sized,
        O: OverlaySink + ?Sized,
    {
        let mut frame = None;
        for target in self.config.calibration_phases() {
            log::info!(
                "calibrating {target}: click samples, 'r' resets, Esc or 'f' finishes, 'q' quits"
            );
            let outcome = self.run_phase(
                target,
                store,
                source,
                input,
                &mut frame,
                overlay.as_deref_mut(),
            )?;
            if outcome == CalibrationOutcome::Quit {
                log::info!("calibration aborted during {target}");
                return Ok(CalibrationOutcome::Quit);
            }
            let range = store.get(target);
            log::info!("{target} range: {:?}..{:?}", range.lower, range.upper);
        }
        Ok(CalibrationOutcome::Completed)
    }

    fn run_phase<S, I, O>(
        &self,
        target: Target,
        store: &mut ColorRangeStore,
        source: &mut S,
        input: &mut I,
        frame: &mut Option<Frame>,
        mut overlay: Option<&mut O>,
    ) -> Result<CalibrationOutcome, RunError>
    where
        S: FrameSource + ?Sized,
        I: InputSource + ?Sized,
        O: OverlaySink + ?Sized,
    {
        let refresh = u64::from(self.config.calibration_refresh.max(1));
        let timeout = self.config.input_timeout();
        let mut cursor = Point2::new(0, 0);
        let mut iteration = 0u64;

        loop {
            if iteration % refresh == 0 || frame.is_none() {
                self.refresh(source, frame)?;
            }
            iteration += 1;

            let events = input.poll(timeout);
            let idle = events.is_empty();
            let Some(current) = frame.as_ref() else {
                if events
                    .iter()
                    .any(|e| e.calibration_command() == Some(CalibrationCommand::Quit))
                {
                    return Ok(CalibrationOutcome::Quit);
                }
                if idle && input.is_closed() {
                    log::error!("no frame to calibrate {target} on and input is closed");
                    return Err(RunError::NoFrame);
                }
                continue;
            };

            let mut finished = false;
            for event in events {
                match event.calibration_command() {
                    Some(CalibrationCommand::Move { x, y }) => cursor = self.to_frame(x, y),
                    Some(CalibrationCommand::Click { x, y }) => {
                        cursor = self.to_frame(x, y);
                        calibrate(store, target, cursor, current, &self.config.calibration);
                    }
                    Some(CalibrationCommand::ResetRange) => {
                        store.reset(target);
                        log::info!("{target} range reset");
                    }
                    Some(CalibrationCommand::Finish) => finished = true,
                    Some(CalibrationCommand::Quit) => return Ok(CalibrationOutcome::Quit),
                    None => {}
                }
            }

            if let Some(sink) = overlay.as_deref_mut() {
                let range = store.get(target);
                let mut view = Overlay::painted_out(current, range);
                view = match target {
                    Target::Track => view.centroid(track(current, range), CENTROID_COLOR),
                    Target::StepMarker => view.centroid(track(current, range), MARKER_COLOR),
                    Target::SwerveMarker => {
                        view.scan(&scan(current, range, &self.config.scanline))
                    }
                };
                let image = view
                    .cursor(cursor, self.config.calibration.radius)
                    .finish();
                sink.show(window_title(target), &image)?;
            }

            if finished {
                return Ok(CalibrationOutcome::Completed);
            }
            if idle && input.is_closed() {
                log::warn!("input closed while calibrating {target}; finishing phase");
                return Ok(CalibrationOutcome::Completed);
            }
        }
    }

    fn refresh<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        frame: &mut Option<Frame>,
    ) -> Result<(), RunError> {
        match source.capture() {
            Ok(image) => {
                *frame = Some(Frame::from_rgb(image, &self.config.preprocess));
                Ok(())
            }
            Err(FrameError::Exhausted) if frame.is_some() => {
                log::debug!("frame source exhausted; calibrating on the last frame");
                Ok(())
            }
            Err(FrameError::Exhausted) => Err(RunError::NoFrame),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                log::warn!("calibration capture failed: {e}");
                Ok(())
            }
        }
    }

    /// Display coordinates back to frame pixels.
    fn to_frame(&self, x: i32, y: i32) -> Point2<i32> {
        let scale = if self.config.display_scale > 0.0 {
            self.config.display_scale
        } else {
            1.0
        };
        Point2::new((x as f32 / scale) as i32, (y as f32 / scale) as i32)
    }
}
