//! Configuration for activity evaluation runs.

use crate::core::ChannelNames;
use crate::dataset::CsvOptions;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for evaluation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sliding window parameters
    pub window: WindowConfig,

    /// Train/test partitioning
    pub split: SplitConfig,

    /// Names of the accelerometer and device columns
    pub channels: ChannelNames,

    /// Name of the class column
    pub label: String,

    /// Label value marking rows without ground truth
    pub missing_label: Option<String>,

    /// Directory for evaluation protocols
    pub protocol_dir: PathBuf,

    /// IANA time zone used for protocol timestamps
    pub timezone: String,

    /// Echo protocol lines to the console
    pub console: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-activity-eval");

        Self {
            window: WindowConfig::default(),
            split: SplitConfig::default(),
            channels: ChannelNames::default(),
            label: "gt".to_string(),
            missing_label: Some("null".to_string()),
            protocol_dir: data_dir.join("protocols"),
            timezone: "UTC".to_string(),
            console: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-activity-eval")
            .join("config.json")
    }

    /// Ensure all output directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.protocol_dir)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.size < 2 || self.window.overlap >= self.window.size {
            return Err(ConfigError::InvalidValue(format!(
                "window size {} with overlap {} (requires size >= 2 and overlap < size)",
                self.window.size, self.window.overlap
            )));
        }
        for (name, value) in [("train", self.split.train), ("test", self.split.test)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} fraction {value} outside [0, 1]"
                )));
            }
        }
        self.timezone()?;
        Ok(())
    }

    /// Parsed protocol time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidValue(format!("unknown time zone '{}'", self.timezone))
        })
    }

    /// CSV loading options derived from this configuration.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            label: self.label.clone(),
            missing_label: self.missing_label.clone(),
            ..CsvOptions::default()
        }
    }
}

/// Sliding window parameters, in instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: 256,
            overlap: 128,
        }
    }
}

/// Train/test partitioning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub train: f64,
    pub test: f64,
    /// Seed for the pre-split shuffle
    pub seed: u64,
    pub shuffle: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train: 0.5,
            test: 0.5,
            seed: 42,
            shuffle: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window, WindowConfig { size: 256, overlap: 128 });
        assert_eq!(config.split.seed, 42);
        assert!(config.split.shuffle);
        assert_eq!(config.label, "gt");
        assert_eq!(config.channels.device, "Device");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "window": { "size": 64, "overlap": 32 } }"#).unwrap();
        assert_eq!(config.window.size, 64);
        assert_eq!(config.window.overlap, 32);
        assert_eq!(config.split.train, 0.5);
        assert_eq!(config.missing_label.as_deref(), Some("null"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.window.overlap = 256;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = Config::default();
        config.split.train = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timezone_parsing() {
        let mut config = Config::default();
        config.timezone = "Europe/Berlin".to_string();
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_csv_options() {
        let mut config = Config::default();
        config.label = "activity".to_string();
        config.missing_label = None;
        let options = config.csv_options();
        assert_eq!(options.label, "activity");
        assert_eq!(options.missing_label, None);
        assert_eq!(options.delimiter, b',');
    }

    #[test]
    fn test_json_roundtrip_keeps_paths() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.protocol_dir, config.protocol_dir);
        assert_eq!(parsed.timezone, config.timezone);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let config: Config =
            serde_json::from_str(r#"{ "online": true, "report_dir": "/tmp/reports" }"#).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("online").is_none());
        assert!(json.get("report_dir").is_none());
        assert!(json.get("step_size").is_none());
    }
}
