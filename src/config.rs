use crate::diagnostics::DeviceSpecifications;
use crate::simulation::NOMINAL_FRAME_DELTA_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
const DEFAULT_READOUT_EVERY_FRAMES: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("frame interval must be at least 1 ms")]
    InvalidFrameInterval,
    #[error("nominal frame delta must be finite and positive, got {0}")]
    InvalidNominalDelta(f32),
}

/// Host settings for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pause between display refreshes.
    pub frame_interval_ms: u64,
    pub nominal_frame_delta_ms: f32,
    /// Fixed seed for reproducible diagnostics; entropy when absent.
    pub seed: Option<u64>,
    pub readout_every_frames: u32,
    /// Stop after this many refreshes; run until interrupted when absent.
    pub max_frames: Option<u64>,
    pub specifications: DeviceSpecifications,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            nominal_frame_delta_ms: NOMINAL_FRAME_DELTA_MS,
            seed: None,
            readout_every_frames: DEFAULT_READOUT_EVERY_FRAMES,
            max_frames: None,
            specifications: DeviceSpecifications::default(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidFrameInterval);
        }
        if !self.nominal_frame_delta_ms.is_finite() || self.nominal_frame_delta_ms <= 0.0 {
            return Err(ConfigError::InvalidNominalDelta(self.nominal_frame_delta_ms));
        }
        Ok(())
    }

    /// Refresh rate implied by the frame interval.
    pub fn frames_per_second(&self) -> f64 {
        1000.0 / self.frame_interval_ms.max(1) as f64
    }

    pub fn set_frames_per_second(&mut self, fps: u32) {
        self.frame_interval_ms = (1000 / u64::from(fps.max(1))).max(1);
    }
}
