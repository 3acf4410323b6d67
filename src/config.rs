// Settings - User defaults loaded from a JSON file
//
// Every field has a default, so a partial file (or no file) is fine. Only the
// octave is range-checked when applied; levels are passed through as given.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::audio::engine::EngineSettings;
use crate::audio::export::ExportSettings;
use crate::synth::notes::OctaveShift;

const APP_DIR: &str = "santoor";
const SETTINGS_FILE: &str = "settings.json";
/// Longest reverb impulse accepted from a settings file
const MAX_IMPULSE_SECONDS: f32 = 30.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub volume: f32,
    pub reverb: f32,
    pub octave: i32,
    /// Sample rate for offline rendering; live playback uses the device rate
    pub sample_rate: u32,
    pub impulse_duration_secs: f32,
    pub impulse_decay: f32,
    pub pointer_repeat_ms: u64,
    pub playback_tail_ms: u64,
    pub command_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            volume: 0.7,
            reverb: 0.3,
            octave: 0,
            sample_rate: 44100,
            impulse_duration_secs: engine.impulse_duration_secs,
            impulse_decay: engine.impulse_decay,
            pointer_repeat_ms: 50,
            playback_tail_ms: 500,
            command_capacity: engine.command_capacity,
        }
    }
}

impl Settings {
    /// `<config dir>/santoor/settings.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the graph unbuildable: non-finite levels,
    /// and impulse durations that are negative, non-finite or absurdly long
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("volume", self.volume),
            ("reverb", self.reverb),
            ("impulse_decay", self.impulse_decay),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is not a finite number", value),
                });
            }
        }

        let duration = self.impulse_duration_secs;
        if !duration.is_finite() || !(0.0..=MAX_IMPULSE_SECONDS).contains(&duration) {
            return Err(ConfigError::Invalid {
                field: "impulse_duration_secs",
                reason: format!("{} is outside 0..={} seconds", duration, MAX_IMPULSE_SECONDS),
            });
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "sample_rate",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn octave_shift(&self) -> OctaveShift {
        OctaveShift::clamped(self.octave)
    }

    pub fn pointer_repeat(&self) -> Duration {
        Duration::from_millis(self.pointer_repeat_ms)
    }

    pub fn playback_tail(&self) -> Duration {
        Duration::from_millis(self.playback_tail_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            impulse_duration_secs: self.impulse_duration_secs,
            impulse_decay: self.impulse_decay,
            command_capacity: self.command_capacity,
        }
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            sample_rate: self.sample_rate,
            octave: self.octave_shift(),
            volume: self.volume,
            reverb: self.reverb,
            engine: self.engine_settings(),
        }
    }
}
