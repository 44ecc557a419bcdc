//! Configuration files for DowelKit
//!
//! A [`Config`] bundles the dowel grid parameters with planner and output
//! preferences. Files are JSON or TOML, chosen by extension, and are
//! validated on both load and save.

use crate::error::{ConfigError, ConfigResult, SettingsResult};
use dowelkit_camtools::dowel::{DowelSettings, DowelSettingsFields, GcodeEmitter, ToolpathPlanner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Planner preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Hole spacing as a multiple of the dowel diameter
    pub spacing_factor: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            spacing_factor: ToolpathPlanner::DEFAULT_SPACING_FACTOR,
        }
    }
}

impl PlannerSettings {
    /// Build the planner these settings describe
    pub fn planner(&self) -> ConfigResult<ToolpathPlanner> {
        ToolpathPlanner::with_spacing_factor(self.spacing_factor).map_err(|_| {
            ConfigError::ValueOutOfRange {
                key: "planner.spacing_factor".to_string(),
                value: self.spacing_factor.to_string(),
            }
        })
    }
}

/// Program output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory generated programs are installed into
    pub directory: PathBuf,
    /// File name of the installed program
    pub file_name: String,
    /// Write a summary comment block after the modal header
    pub include_comments: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            file_name: "dowel_program.gcode".to_string(),
            include_comments: false,
        }
    }
}

impl OutputSettings {
    /// Full path of the installed program
    pub fn target_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Emitter configured by these settings
    pub fn emitter(&self) -> GcodeEmitter {
        GcodeEmitter::new().with_comments(self.include_comments)
    }
}

/// Complete DowelKit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Dowel grid parameters
    pub dowel: DowelSettingsFields,
    /// Planner preferences
    pub planner: PlannerSettings,
    /// Output preferences
    pub output: OutputSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.dowel_settings()?;
        self.planner.planner()?;

        if self.output.file_name.trim().is_empty() {
            return Err(ConfigError::ValueOutOfRange {
                key: "output.file_name".to_string(),
                value: self.output.file_name.clone(),
            });
        }

        Ok(())
    }

    /// Validated dowel settings from the `dowel` section
    pub fn dowel_settings(&self) -> ConfigResult<DowelSettings> {
        Ok(DowelSettings::create(self.dowel.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dowelkit_core::units::UnitSystem;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.planner.spacing_factor, 2.0);
        assert_eq!(config.output.file_name, "dowel_program.gcode");
        assert_eq!(config.dowel_settings().unwrap(), DowelSettings::default());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("a.yaml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_invalid_sections_are_rejected() {
        let mut config = Config::new();
        config.dowel.tool_diameter = 10.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDowel(_))
        ));

        let mut config = Config::new();
        config.planner.spacing_factor = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));

        let mut config = Config::new();
        config.output.file_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [dowel]
            grid_count_x = 4
            units = "imperial"
            dowel_diameter = 0.5
            dowel_length = 1.0
            tool_diameter = 0.25
            pass_depth = 0.25
            safety_height = 0.2
            feed_rate = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.dowel.grid_count_x, 4);
        assert_eq!(config.dowel.grid_count_y, 3);
        assert_eq!(config.dowel.units, UnitSystem::Imperial);
        assert_eq!(config.planner, PlannerSettings::default());
        assert!(config.validate().is_ok());
    }
}
