//! Synthesizer configuration.
//!
//! Every field has a default, so an absent or partial JSON file is valid.
//! The file is looked up from `IMPACT_CONFIG` first, then `impact.json` in
//! the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "IMPACT_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "impact.json";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the `dt` handed to `Visualization::update` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// Constant step every frame, regardless of wall-clock time.
    Fixed { dt: f32 },
    /// Wall-clock time since the previous frame, clamped to a quarter second.
    Measured,
}

impl Default for StepMode {
    fn default() -> Self {
        Self::Fixed { dt: 0.05 }
    }
}

/// Top-level synthesizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frame rate the main loop paces itself to.
    pub target_fps: u32,
    /// Source of the per-frame `dt`.
    pub step: StepMode,
    /// Whether the diagnostic overlay starts visible (F1 toggles it).
    pub show_overlay: bool,
    /// Spacing of the overlay grid in pixels.
    pub grid_spacing: u32,
    /// Directory scanned for WAV samples.
    pub samples_dir: PathBuf,
    /// Directory searched for visualization images.
    pub images_dir: PathBuf,
    /// Replacement WGSL post-process shader. The built-in one is used when unset.
    pub shader_path: Option<PathBuf>,
    /// Substring of the MIDI port name to prefer. First port otherwise.
    pub midi_port_hint: Option<String>,
    /// Registry keys to load, in order. All built-ins when unset.
    pub visualizations: Option<Vec<String>>,
    /// CC number mapped to global brightness.
    pub brightness_cc: u8,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            target_fps: 30,
            step: StepMode::default(),
            show_overlay: true,
            grid_spacing: 50,
            samples_dir: PathBuf::from("samples"),
            images_dir: PathBuf::from("assets/images"),
            shader_path: None,
            midi_port_hint: None,
            visualizations: None,
            brightness_cc: 7,
        }
    }
}

impl SynthConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate config JSON.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the config file (`IMPACT_CONFIG`, then `impact.json`) and load it,
    /// falling back to defaults when neither exists.
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            log::info!("Loading config from {} ({})", path.display(), CONFIG_ENV_VAR);
            return Self::load(&path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            log::info!("Loading config from {}", local.display());
            return Self::load(local);
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Reject values the main loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be at least 1".into()));
        }
        if let StepMode::Fixed { dt } = self.step {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "fixed step must be positive, got {dt}"
                )));
            }
        }
        if self.grid_spacing == 0 {
            return Err(ConfigError::Invalid("grid_spacing must be at least 1".into()));
        }
        if self.brightness_cc > 127 {
            return Err(ConfigError::Invalid(format!(
                "brightness_cc must be 0-127, got {}",
                self.brightness_cc
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SynthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.step, StepMode::Fixed { dt: 0.05 });
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SynthConfig::from_json(r#"{ "width": 640, "height": 480 }"#).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.grid_spacing, 50);
        assert!(config.show_overlay);
    }

    #[test]
    fn test_step_mode_parsing() {
        let config = SynthConfig::from_json(r#"{ "step": { "mode": "measured" } }"#).unwrap();
        assert_eq!(config.step, StepMode::Measured);

        let config =
            SynthConfig::from_json(r#"{ "step": { "mode": "fixed", "dt": 0.02 } }"#).unwrap();
        assert_eq!(config.step, StepMode::Fixed { dt: 0.02 });
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SynthConfig::from_json(r#"{ "fullscreen": true }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for json in [
            r#"{ "width": 0 }"#,
            r#"{ "target_fps": 0 }"#,
            r#"{ "grid_spacing": 0 }"#,
            r#"{ "step": { "mode": "fixed", "dt": 0.0 } }"#,
            r#"{ "brightness_cc": 200 }"#,
        ] {
            assert!(
                matches!(SynthConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "expected {json} to be rejected"
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = SynthConfig::load(Path::new("/nonexistent/impact.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_config_serialization() {
        let config = SynthConfig {
            visualizations: Some(vec!["6_a_life".into(), "3_sine_wave".into()]),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed = SynthConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
