//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::insights::InsightSettings;
use crate::session::SessionConfig;
use crate::storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub insights: InsightSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Days after which a day can no longer be amended (0 = never)
    #[serde(default)]
    pub immutable_after_days: u32,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("embermate").to_string_lossy().to_string())
        .unwrap_or_else(|| "./embermate_data".to_string())
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            busy_timeout_ms: default_busy_timeout(),
            immutable_after_days: 0,
        }
    }
}

impl StorageConfig {
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: PathBuf::from(&self.data_dir),
            busy_timeout_ms: self.busy_timeout_ms,
            immutable_after_days: self.immutable_after_days,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults plus overrides; invalid overrides fall back to the defaults
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        config.apply_overrides(lookup);
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                Config::default()
            }
        }
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, |key| std::env::var(key).ok())
    }

    fn load_with_lookup(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("embermate").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.flush_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.flush_interval_ms must be positive".into(),
            ));
        }
        if self.session.retry_base_ms > self.session.retry_max_ms {
            return Err(ConfigError::Invalid(
                "session.retry_base_ms exceeds session.retry_max_ms".into(),
            ));
        }
        if self.insights.correlation_window_days == 0 || self.insights.summary_window_days == 0 {
            return Err(ConfigError::Invalid("insight windows must cover at least one day".into()));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "unknown logging.format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = lookup("EMBERMATE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // Insight overrides
        if let Some(window) = lookup("EMBERMATE_CORRELATION_WINDOW") {
            match window.parse() {
                Ok(days) if days > 0 => self.insights.correlation_window_days = days,
                _ => tracing::warn!("Ignoring EMBERMATE_CORRELATION_WINDOW={}", window),
            }
        }

        // Logging overrides
        if let Some(level) = lookup("EMBERMATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("EMBERMATE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# EmberMate Configuration
#
# Environment variables override these settings:
# - EMBERMATE_DATA_DIR
# - EMBERMATE_CORRELATION_WINDOW
# - EMBERMATE_LOG_LEVEL
# - EMBERMATE_LOG_FORMAT

[storage]
# Directory for the day log database
data_dir = "~/.local/share/embermate"

# How long to wait on a locked database (ms)
busy_timeout_ms = 5000

# Days after which a day can no longer be edited (0 = always editable)
immutable_after_days = 0

[session]
# How often pending edits are flushed to disk (ms)
flush_interval_ms = 1000

# First retry delay after a failed flush; doubles per attempt (ms)
retry_base_ms = 500

# Longest retry delay (ms)
retry_max_ms = 60000

[insights]
# Days compared when ranking signal correlations
correlation_window_days = 14

# Days covered by the weekly summary
summary_window_days = 7

# Day score rounding: half_away_from_zero, half_to_even or floor
rounding = "half_away_from_zero"

# Day scores below this count as tough days
tough_day_threshold = 40

# Usual ranges used for "stable vitals" days
[insights.vital_ranges]
systolic = { min = 90.0, max = 140.0 }
diastolic = { min = 60.0, max = 90.0 }
heart_rate = { min = 50.0, max = 100.0 }
spo2 = { min = 94.0, max = 100.0 }
temperature_c = { min = 36.0, max = 37.8 }
blood_glucose = { min = 70.0, max = 180.0 }

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/embermate/embermate.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::RoundingRule;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.insights, InsightSettings::default());
        assert_eq!(config.storage.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\ndata_dir = \"/tmp/ember\"\n\n[insights]\nrounding = \"half_to_even\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/ember");
        assert_eq!(config.insights.rounding, RoundingRule::HalfToEven);
        assert_eq!(config.insights.correlation_window_days, 14);
        assert_eq!(config.session.retry_max_ms, 60_000);

        let store = config.storage.to_store_config();
        assert_eq!(store.db_path(), PathBuf::from("/tmp/ember/embermate.db"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nretry_base_ms = 9000\nretry_max_ms = 10\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "[logging]\nformat = \"xml\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "[storage\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("EMBERMATE_DATA_DIR", "/data/ember"),
            ("EMBERMATE_CORRELATION_WINDOW", "30"),
            ("EMBERMATE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.storage.data_dir, "/data/ember");
        assert_eq!(config.insights.correlation_window_days, 30);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");

        // Unparseable values are ignored
        config.apply_overrides(|key| (key == "EMBERMATE_CORRELATION_WINDOW").then(|| "two weeks".to_string()));
        assert_eq!(config.insights.correlation_window_days, 30);
    }

    #[test]
    fn test_invalid_env_overrides_are_validated() {
        let xml = |key: &str| (key == "EMBERMATE_LOG_FORMAT").then(|| "xml".to_string());

        let config = Config::from_lookup(xml);
        assert_eq!(config.logging.format, "pretty");

        let config = Config::from_lookup(|key| (key == "EMBERMATE_LOG_FORMAT").then(|| "json".to_string()));
        assert_eq!(config.logging.format, "json");

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"info\"\n").unwrap();
        assert!(matches!(
            Config::load_with_lookup(&path, xml),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(Config::load_with_lookup(&path, |_| None).unwrap().logging.level, "info");
    }
}
