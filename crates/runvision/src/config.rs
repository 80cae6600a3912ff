use crate::error::ConfigError;
use runvision_nav::{Challenges, NavParams};
use runvision_segment::{
    CalibrationParams, ColorRangeStore, PreprocessParams, ScanlineParams, Target,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything a run needs besides its adapters. Loaded from JSON; every
/// field is optional in the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub preprocess: PreprocessParams,
    pub calibration: CalibrationParams,
    pub scanline: ScanlineParams,
    pub nav: NavParams,
    pub challenges: Challenges,
    /// Factor between frame pixels and displayed/clicked coordinates.
    pub display_scale: f32,
    /// Upper bound on the per-cycle input wait.
    pub input_timeout_ms: u64,
    /// Calibration captures a new frame every this many iterations.
    pub calibration_refresh: u32,
    pub max_cycles: Option<u64>,
    /// Use the ranges already in the store instead of calibrating.
    pub skip_calibration: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessParams::default(),
            calibration: CalibrationParams::default(),
            scanline: ScanlineParams::default(),
            nav: NavParams::default(),
            challenges: Challenges::default(),
            display_scale: 1.0,
            input_timeout_ms: 20,
            calibration_refresh: 11,
            max_cycles: None,
            skip_calibration: false,
        }
    }
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_json(path.as_ref(), self)
    }

    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms)
    }

    /// Targets calibrated before the run, in order.
    pub fn calibration_phases(&self) -> Vec<Target> {
        let mut phases = vec![Target::Track];
        if self.challenges.step {
            phases.push(Target::StepMarker);
        }
        if self.challenges.swerve {
            phases.push(Target::SwerveMarker);
        }
        phases
    }
}

pub fn load_ranges(path: impl AsRef<Path>) -> Result<ColorRangeStore, ConfigError> {
    read_json(path.as_ref())
}

pub fn save_ranges(store: &ColorRangeStore, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    write_json(path.as_ref(), store)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
