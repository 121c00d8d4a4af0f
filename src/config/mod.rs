//! Configuration for the analyzer CLI.
//!
//! Configuration comes from an optional TOML file. Every field has a
//! default, so an absent file or an empty document is a valid
//! configuration.
//!
//! # Example
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [simulator]
//! annualization_months = 12
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::services::simulator::DEFAULT_ANNUALIZATION_MONTHS;

/// Root configuration for the analyzer.
///
/// All sections are optional with sensible defaults, allowing the tool to
/// run with no configuration file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulator constants.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.annualization_months <= 0 {
            return Err(ConfigError::Validation(format!(
                "simulator.annualization_months must be positive, got {}",
                self.simulator.annualization_months
            )));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include file/line information.
    #[serde(default)]
    pub file_line: bool,

    /// Filter directives (e.g., "tollgate::dataset=trace").
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
            file_line: false,
            filter: None,
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
    /// JSON format (for log aggregation).
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulator
// ─────────────────────────────────────────────────────────────────────────────

/// Simulator constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Months per year of savings when annualizing.
    #[serde(default = "default_annualization_months")]
    pub annualization_months: i64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            annualization_months: default_annualization_months(),
        }
    }
}

fn default_annualization_months() -> i64 {
    DEFAULT_ANNUALIZATION_MONTHS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();

        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.logging.timestamps);
        assert_eq!(config.simulator.annualization_months, 12);
    }

    #[test]
    fn test_full_config_parses() {
        let config = AppConfig::from_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            timestamps = false
            filter = "tollgate::dataset=trace"

            [simulator]
            annualization_months = 6
        "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.timestamps);
        assert_eq!(
            config.logging.filter.as_deref(),
            Some("tollgate::dataset=trace")
        );
        assert_eq!(config.simulator.annualization_months, 6);
    }

    #[test]
    fn test_non_positive_annualization_rejected() {
        let err = AppConfig::from_str(
            r#"
            [simulator]
            annualization_months = 0
        "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("annualization_months"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = AppConfig::from_str(
            r#"
            [logging]
            verbosity = "high"
        "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(
            serde_json::from_str::<LogFormat>("\"pretty\"").unwrap(),
            LogFormat::Pretty
        );
        assert_eq!(
            serde_json::from_str::<LogFormat>("\"compact\"").unwrap(),
            LogFormat::Compact
        );
        assert_eq!(
            serde_json::from_str::<LogFormat>("\"json\"").unwrap(),
            LogFormat::Json
        );
    }
}
