// Editor configuration - grid geometry, scene length and scheduler timing
// Passed by value to every consumer instead of living in mutable globals

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid tempo: {0} BPM (must be > 0)")]
    InvalidTempo(f64),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Piano roll geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of one grid step (one beat) in pixels
    pub pixels_per_beat: f64,
    /// Height of one pitch row in pixels
    pub key_height: f64,
}

impl GridConfig {
    /// Convert a beat position to a horizontal pixel offset
    pub fn beat_to_pixel(&self, beat: f64) -> f64 {
        beat * self.pixels_per_beat
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            pixels_per_beat: 100.0,
            key_height: 20.0,
        }
    }
}

/// MIDI export settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Note-On velocity (1-127)
    pub velocity: u8,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            channel: 0,
            velocity: 100,
        }
    }
}

/// Full editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid: GridConfig,
    /// Playback auto-stops once the playhead passes this beat
    pub scene_length_beats: f64,
    /// Scheduler tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Tempo used when the editor starts
    pub initial_tempo_bpm: f64,
    /// Capacity of the playback event channel
    pub event_capacity: usize,
    pub midi: MidiSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            scene_length_beats: 40.0,
            tick_interval_ms: 20,
            initial_tempo_bpm: 90.0,
            event_capacity: 256,
            midi: MidiSettings::default(),
        }
    }
}

impl EditorConfig {
    /// Load a configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = ron::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid.pixels_per_beat > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "pixels_per_beat must be > 0, got {}",
                self.grid.pixels_per_beat
            )));
        }
        if !(self.grid.key_height > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "key_height must be > 0, got {}",
                self.grid.key_height
            )));
        }
        if !(self.scene_length_beats > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "scene_length_beats must be > 0, got {}",
                self.scene_length_beats
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "event_capacity must be > 0".to_string(),
            ));
        }
        if self.midi.channel > 15 {
            return Err(ConfigError::InvalidValue(format!(
                "MIDI channel must be 0-15, got {}",
                self.midi.channel
            )));
        }
        if self.midi.velocity == 0 || self.midi.velocity > 127 {
            return Err(ConfigError::InvalidValue(format!(
                "MIDI velocity must be 1-127, got {}",
                self.midi.velocity
            )));
        }
        if !(self.initial_tempo_bpm.is_finite() && self.initial_tempo_bpm > 0.0) {
            return Err(ConfigError::InvalidTempo(self.initial_tempo_bpm));
        }
        Ok(())
    }

    /// Scheduler tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.grid.pixels_per_beat, 100.0);
        assert_eq!(config.scene_length_beats, 40.0);
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
        assert_eq!(config.initial_tempo_bpm, 90.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_conversion() {
        let grid = GridConfig::default();
        assert_eq!(grid.beat_to_pixel(2.5), 250.0);
        assert_eq!(grid.beat_to_pixel(0.0), 0.0);

        let wide = GridConfig {
            pixels_per_beat: 64.0,
            ..grid
        };
        assert_eq!(wide.beat_to_pixel(3.0), 192.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EditorConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.midi.channel = 16;
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.initial_tempo_bpm = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTempo(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.ron");

        let mut config = EditorConfig::default();
        config.scene_length_beats = 64.0;
        config.midi.velocity = 90;
        config.save(&path).unwrap();

        let loaded = EditorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.ron");
        fs::write(&path, "(tick_interval_ms: 10)").unwrap();

        let loaded = EditorConfig::load(&path).unwrap();
        assert_eq!(loaded.tick_interval_ms, 10);
        assert_eq!(loaded.scene_length_beats, 40.0);
    }

    #[test]
    fn test_missing_file() {
        let err = EditorConfig::load("/nonexistent/editor.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
