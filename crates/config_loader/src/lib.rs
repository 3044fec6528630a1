//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a [`NavConfig`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("usnav.toml")).unwrap();
//! println!("max lag: {}", config.temporal_calibration.max_tracker_lag_sec);
//! ```

mod parser;
mod validator;

pub use contracts::NavConfig;
pub use parser::ConfigFormat;

use contracts::NavError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<NavConfig, NavError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<NavConfig, NavError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already built configuration
    pub fn validate(config: &NavConfig) -> Result<(), NavError> {
        validator::validate(config)
    }

    /// Serialize NavConfig to TOML string
    pub fn to_toml(config: &NavConfig) -> Result<String, NavError> {
        toml::to_string_pretty(config)
            .map_err(|e| NavError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize NavConfig to JSON string
    pub fn to_json(config: &NavConfig) -> Result<String, NavError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| NavError::config_parse(format!("JSON serialize error: {e}")))
    }

    /// Write NavConfig to a file, format chosen by extension
    pub fn save_to_path(config: &NavConfig, path: &Path) -> Result<(), NavError> {
        let content = match Self::detect_format(path)? {
            ConfigFormat::Toml => Self::to_toml(config)?,
            ConfigFormat::Json => Self::to_json(config)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, NavError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| NavError::config_parse("cannot determine file format from extension"))?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| NavError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, NavError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<NavConfig, NavError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
version = "V1"

[temporal_calibration]
sampling_resolution_sec = 0.001
max_tracker_lag_sec = 2.0
probe_to_reference_transform = "ProbeToReference"
peak_position = "centroid"
scanline_count = 20
min_valid_scanlines = 5

[temporal_calibration.line_fit]
inlier_distance_px = 0.5
confidence = 0.999
max_iterations = 1000
seed = 1234567

[[coordinate_definitions.transforms]]
from = "Image"
to = "Probe"
matrix = [[1.0,0.0,0.0,0.0],[0.0,1.0,0.0,0.0],[0.0,0.0,1.0,0.0],[0.0,0.0,0.0,1.0]]
persistent = true
date = "2011.12.01 17:57:00"
error = 0.5
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.temporal_calibration.scanline_count, 20);
        assert_eq!(config.coordinate_definitions.transforms.len(), 1);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(
            config.coordinate_definitions,
            config2.coordinate_definitions
        );
        assert_eq!(
            config.temporal_calibration.probe_to_reference_transform,
            config2.temporal_calibration.probe_to_reference_transform
        );
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(
            config.coordinate_definitions,
            config2.coordinate_definitions
        );
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[temporal_calibration]
scanline_count = 3
min_valid_scanlines = 4
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(matches!(result, Err(NavError::ConfigValidation { .. })));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.coordinate_definitions.transforms[0].from, "Image");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::load_from_path(file.path());
        assert!(matches!(result, Err(NavError::ConfigParse { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(NavError::Io(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();

        ConfigLoader::save_to_path(&config, &path).unwrap();
        let reloaded = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(reloaded.coordinate_definitions, config.coordinate_definitions);
    }
}
