//! Engine configuration, loadable from RON.
//!
//! ```ron
//! (
//!     max_channels: 512,
//!     distance_factor: 3.28,
//!     listener: (position: (0.0, 1.8, 0.0), forward: (0.0, 0.0, 1.0), up: (0.0, 1.0, 0.0)),
//!     reverb: Some((position: (0.0, 0.0, 0.0), min_distance: 10.0, max_distance: 50.0, preset: Hallway)),
//! )
//! ```

use std::path::Path;

use audio_backend::{BackendConfig, ReverbPreset, SpeakerMode};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fade::{AUDIO_SAMPLE_RATE, DEFAULT_FADE_FLOOR_SAMPLES};
use crate::spacialiser::ListenerPose;

/// Positional reverb zone created at `init()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbZoneConfig {
    pub position: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub preset: ReverbPreset,
}

impl Default for ReverbZoneConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            min_distance: 10.0,
            max_distance: 50.0,
            preset: ReverbPreset::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_channels: u32,
    pub sample_rate: u32,
    pub speaker_mode: SpeakerMode,
    /// Backend units per caller unit (feet = 3.28, centimeters = 100).
    pub distance_factor: f32,
    pub doppler_scale: f32,
    pub rolloff_scale: f32,
    /// Audible distance bounds for 3D sounds, in caller units.
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fades at or below this many samples are applied as a step.
    pub fade_floor_samples: u64,
    /// Initial listener pose, in caller units.
    pub listener: ListenerPose,
    pub reverb: Option<ReverbZoneConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_channels: 1024,
            sample_rate: AUDIO_SAMPLE_RATE,
            speaker_mode: SpeakerMode::Stereo,
            distance_factor: 1.0,
            doppler_scale: 1.0,
            rolloff_scale: 1.0,
            min_distance: 0.5,
            max_distance: 5000.0,
            fade_floor_samples: DEFAULT_FADE_FLOOR_SAMPLES,
            listener: ListenerPose::default(),
            reverb: Some(ReverbZoneConfig::default()),
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            max_channels: self.max_channels,
            sample_rate: self.sample_rate,
            speaker_mode: self.speaker_mode,
            doppler_scale: self.doppler_scale,
            distance_factor: self.distance_factor,
            rolloff_scale: self.rolloff_scale,
        }
    }
}
