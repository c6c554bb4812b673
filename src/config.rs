// Converter configuration
// Tunable thresholds for extraction, humanization and note writing, loadable from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a single conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Snap notes near an eighth-note grid line onto it
    pub quantize: bool,

    /// Note-on events below this velocity are ignored (0-127)
    pub min_velocity: u8,

    /// Maximum simultaneous non-kick notes per tick
    pub max_hands: usize,

    /// Zero-based channel carrying the percussion part (General MIDI = 9)
    pub percussion_channel: u8,

    /// Snap window as a fraction of the tick resolution
    /// 0.11 at 480 PPQ = 52.8 ticks either side of a grid line
    pub snap_tolerance: f64,

    /// Grid lines per quarter note (2 = eighth notes)
    pub snap_division: u16,

    /// Ticks between a gem's note-on and note-off
    pub note_length: u32,

    /// Velocity written on every output note-on
    pub note_velocity: u8,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            quantize: true,
            min_velocity: 20,
            max_hands: 2,
            percussion_channel: 9,
            snap_tolerance: 0.11,
            snap_division: 2,
            note_length: 1,
            note_velocity: 100,
        }
    }
}

impl ConvertConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ConvertConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "Failed to load config {}: {}. Using defaults.",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Reject settings no conversion can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hands == 0 {
            return Err(ConfigError::Invalid("max_hands must be at least 1".into()));
        }
        if self.snap_division == 0 {
            return Err(ConfigError::Invalid("snap_division must be at least 1".into()));
        }
        if self.note_length == 0 {
            return Err(ConfigError::Invalid("note_length must be at least 1".into()));
        }
        if self.percussion_channel > 15 {
            return Err(ConfigError::Invalid(format!(
                "percussion_channel {} is out of range 0-15",
                self.percussion_channel
            )));
        }
        if !self.snap_tolerance.is_finite() || self.snap_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "snap_tolerance {} must be a non-negative number",
                self.snap_tolerance
            )));
        }
        if self.min_velocity > 127 || self.note_velocity > 127 {
            return Err(ConfigError::Invalid("velocities must be within 0-127".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConvertConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_velocity, 20);
        assert_eq!(config.max_hands, 2);
        assert_eq!(config.percussion_channel, 9);
        assert!(config.quantize);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drumchart.toml");
        fs::write(&path, "quantize = false\nmin_velocity = 40\n").unwrap();

        let config = ConvertConfig::load(&path).unwrap();
        assert!(!config.quantize);
        assert_eq!(config.min_velocity, 40);
        assert_eq!(config.max_hands, 2);
        assert_eq!(config.note_length, 1);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drumchart.toml");
        fs::write(&path, "max_hands = 0\n").unwrap();

        assert!(matches!(
            ConvertConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("missing.toml");
        assert_eq!(ConvertConfig::load_or_default(&missing), ConvertConfig::default());

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "quantize = \"maybe\"").unwrap();
        assert_eq!(ConvertConfig::load_or_default(&broken), ConvertConfig::default());
    }

    #[test]
    fn test_validate_channel_and_tolerance() {
        let config = ConvertConfig {
            percussion_channel: 16,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConvertConfig {
            snap_tolerance: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
