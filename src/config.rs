//! Persistent application configuration
//!
//! Stores device selection, sample rate, and echo parameters in a JSON
//! file under the platform config directory, overridable with the
//! `ECHOSCOPE_CONFIG` environment variable.

use echoscope_core::EchoParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest echo cycle accepted from config (seconds)
const MAX_ECHO_SECONDS: f32 = 5.0;

/// Most echo repeats accepted from config
const MAX_ECHO_TAPS: usize = 8;

fn default_sample_rate() -> u32 {
    echoscope_core::DEFAULT_SAMPLE_RATE
}

fn default_echo_seconds() -> f32 {
    EchoParams::default().echo_seconds
}

fn default_echo_taps() -> usize {
    EchoParams::default().tap_count
}

fn default_echo_level() -> f32 {
    EchoParams::default().level
}

/// Persistent application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Selected output device name (None = host default)
    #[serde(default)]
    pub device: Option<String>,
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Echo cycle duration in seconds
    #[serde(default = "default_echo_seconds")]
    pub echo_seconds: f32,
    /// Number of echo repeats tracked
    #[serde(default = "default_echo_taps")]
    pub echo_taps: usize,
    /// Per-repeat attenuation
    #[serde(default = "default_echo_level")]
    pub echo_level: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: default_sample_rate(),
            echo_seconds: default_echo_seconds(),
            echo_taps: default_echo_taps(),
            echo_level: default_echo_level(),
        }
    }
}

impl AppConfig {
    /// Config file path: `$ECHOSCOPE_CONFIG` if set, otherwise
    /// `<config_dir>/echoscope/config.json`
    pub fn path() -> PathBuf {
        if let Ok(path) = std::env::var("ECHOSCOPE_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("echoscope")
            .join("config.json")
    }

    /// Load config from `path`, falling back to defaults on any error
    ///
    /// A missing file is the normal first run; a malformed file is logged
    /// and ignored rather than aborting startup.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }

    /// Echo parameters with host-range clamps applied
    pub fn echo_params(&self) -> EchoParams {
        EchoParams {
            echo_seconds: self.echo_seconds.clamp(0.0, MAX_ECHO_SECONDS),
            tap_count: self.echo_taps.clamp(1, MAX_ECHO_TAPS),
            level: self.echo_level.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.device, None);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.echo_taps, 3);
    }

    #[test]
    fn test_round_trip() {
        let config = AppConfig {
            device: Some("USB Audio".to_string()),
            sample_rate: 96000,
            echo_seconds: 0.5,
            echo_taps: 4,
            echo_level: 0.3,
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.device, Some("USB Audio".to_string()));
        assert_eq!(loaded.sample_rate, 96000);
        assert_eq!(loaded.echo_taps, 4);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"device": "TestDevice"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device, Some("TestDevice".to_string()));
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.echo_seconds, 0.25);
        assert_eq!(config.echo_level, 0.5);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.device, None);
        assert_eq!(config.echo_taps, 3);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json"));
        assert_eq!(config.sample_rate, 48000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            device: Some("Test Out".to_string()),
            sample_rate: 44100,
            echo_seconds: 1.0,
            echo_taps: 2,
            echo_level: 0.8,
        };
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.device, Some("Test Out".to_string()));
        assert_eq!(loaded.sample_rate, 44100);
        assert_eq!(loaded.echo_taps, 2);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json at all {").unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.sample_rate, 48000);
    }

    #[test]
    fn test_echo_params_clamped() {
        let config = AppConfig {
            device: None,
            sample_rate: 48000,
            echo_seconds: 99.0,
            echo_taps: 0,
            echo_level: -2.0,
        };
        let params = config.echo_params();
        assert_eq!(params.echo_seconds, MAX_ECHO_SECONDS);
        assert_eq!(params.tap_count, 1);
        assert_eq!(params.level, 0.0);
    }
}
