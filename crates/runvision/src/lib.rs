//! High-level facade for the `runvision-*` workspace.
//!
//! This crate provides:
//! - re-exports of the image primitives, segmentation and navigation crates,
//! - the adapters around them (frame sources, blackboard and head sinks,
//!   operator input, overlay rendering),
//! - the calibration session and the control loop that ties it all together.
//!
//! ## Quickstart
//!
//! ```no_run
//! use runvision::{
//!     load_ranges, JsonLinesBlackboard, LogHead, MemorySource, NoInput, RunConfig, Runner,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig {
//!     skip_calibration: true,
//!     ..RunConfig::default()
//! };
//! let ranges = load_ranges("ranges.json")?;
//! let source = MemorySource::new(Vec::new());
//! let blackboard = JsonLinesBlackboard::create("blackboard.jsonl")?;
//!
//! let summary = Runner::new(config, source, blackboard, LogHead, NoInput)
//!     .with_ranges(ranges)
//!     .run()?;
//! println!("{} cycles, final state {}", summary.cycles, summary.final_state);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `runvision::core`: image buffers, blur, HSV, masking, regions, logger.
//! - `runvision::segment`: color ranges, calibration, tracker, scanline scanner.
//! - `runvision::nav`: commands and the navigation state machine.
//! - `runvision::imageio` (feature `image`): conversions from/to `image` buffers.

pub use runvision_core as core;
pub use runvision_nav as nav;
pub use runvision_segment as segment;

mod calibrate;
mod config;
mod error;
mod input;
mod overlay;
mod runner;
mod sink;
mod source;

#[cfg(feature = "image")]
pub mod imageio;

pub use calibrate::{window_title, CalibrationOutcome, CalibrationSession};
pub use config::{load_ranges, save_ranges, RunConfig};
pub use error::{ConfigError, FrameError, RunError, SinkError};
pub use input::{
    parse_line, CalibrationCommand, Command, InputEvent, InputSource, NoInput, ScriptedEvent,
    ScriptedInput, StdinInput,
};
pub use overlay::{CountingOverlay, Overlay, OverlaySink};
pub use runner::{ExitReason, RunSummary, Runner};
pub use sink::{
    ActuatorSink, BlackboardRecord, HeadActuator, JsonLinesBlackboard, LogHead, MemoryBlackboard,
    RecordingHead, KEY_ACTION, KEY_FORWARD, KEY_LATERAL, KEY_TURNING,
};
pub use source::{FrameSource, MemorySource};

#[cfg(feature = "image")]
pub use overlay::PngOverlay;
#[cfg(feature = "image")]
pub use source::ImageSequenceSource;

pub use runvision_nav::{ActuatorCommand, Challenges, HeadCommand, NavParams, NavState};
pub use runvision_segment::{ColorRange, ColorRangeStore, Target};
