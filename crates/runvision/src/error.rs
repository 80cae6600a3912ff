use runvision_core::ImageError;
use std::path::PathBuf;

/// Errors produced by a [`FrameSource`](crate::FrameSource).
///
/// Everything except [`Exhausted`](FrameError::Exhausted) and
/// [`Disconnected`](FrameError::Disconnected) is a per-cycle fault: the loop
/// logs it and skips the cycle.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("frame source exhausted")]
    Exhausted,

    #[error("frame source disconnected: {0}")]
    Disconnected(String),

    #[error("frame not ready: {0}")]
    Unavailable(String),

    #[error("no frames found in {}", .0.display())]
    Empty(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error(transparent)]
    Image(#[from] ImageError),
}

impl FrameError {
    /// Faults after which the source cannot produce further frames.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Disconnected(_) | FrameError::Empty(_))
    }
}

/// Errors from the actuator, head and overlay sinks.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },
}

/// Errors loading or saving JSON configuration and calibrated ranges.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error of a calibration or control run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no frame was captured before the source ran out")]
    NoFrame,
}
