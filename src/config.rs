/// Dashboard configuration
///
/// Loaded from a TOML file, then overridden from the process environment
/// (and a `.env` file when present) so deployments can keep secrets such as
/// the store API key out of the checked-in config.
///
/// ```toml
/// timezone = "America/Los_Angeles"
/// manual_expected_interval_ms = 60000
///
/// [store]
/// project_id = "crystal-cove"
///
/// [logging]
/// level = "info"
/// file = "covemon.log"
/// ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::ingest::assembler::RangeAssembler;
use crate::ingest::firestore::{FirestoreStore, FIRESTORE_BASE_URL};
use crate::logging::{self, Component, LogLevel};
use crate::model::{SensorGroup, StoreError};
use crate::timezone::{AppTimezone, DEFAULT_APP_TIMEZONE};

pub const DEFAULT_ENVIRONMENT_COLLECTION: &str = "raccoonbot_data";
pub const DEFAULT_STATUS_COLLECTION: &str = "crystal_cove";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),
    #[error("expected interval must be positive, got {0}")]
    InvalidInterval(i64),
}

// ---------------------------------------------------------------------------
// Config structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// IANA zone that defines every "day" and "hour" in the pipeline.
    pub timezone: String,
    /// Overrides the estimated sampling interval for gap filling.
    pub manual_expected_interval_ms: Option<i64>,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub project_id: String,
    pub environment_collection: String,
    pub status_collection: String,
    pub base_url: String,
    /// Only ever taken from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_APP_TIMEZONE.name().to_string(),
            manual_expected_interval_ms: None,
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            environment_collection: DEFAULT_ENVIRONMENT_COLLECTION.to_string(),
            status_collection: DEFAULT_STATUS_COLLECTION.to_string(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads `path`, applies environment overrides, and validates the result.
pub fn load_config(path: impl AsRef<Path>) -> Result<DashboardConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: DashboardConfig =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

    dotenv::dotenv().ok();
    config.apply_overrides(|key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

impl DashboardConfig {
    /// Parses and validates TOML without consulting the environment.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `COVEMON_*` and `FIRESTORE_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(tz) = lookup("COVEMON_TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(raw) = lookup("COVEMON_EXPECTED_INTERVAL_MS") {
            let ms = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::Parse(format!("COVEMON_EXPECTED_INTERVAL_MS='{}'", raw)))?;
            self.manual_expected_interval_ms = Some(ms);
        }
        if let Some(project) = lookup("FIRESTORE_PROJECT_ID") {
            self.store.project_id = project;
        }
        if let Some(key) = lookup("FIRESTORE_API_KEY") {
            self.store.api_key = Some(key).filter(|k| !k.is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.app_timezone()?;
        if let Some(ms) = self.manual_expected_interval_ms {
            if ms <= 0 {
                return Err(ConfigError::InvalidInterval(ms));
            }
        }
        self.log_level()?;
        Ok(())
    }

    pub fn app_timezone(&self) -> Result<AppTimezone, ConfigError> {
        AppTimezone::from_name(&self.timezone)
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging.level.parse().map_err(ConfigError::Parse)
    }

    /// Root collection holding `group`'s day-documents.
    pub fn collection_for(&self, group: SensorGroup) -> &str {
        match group {
            SensorGroup::Environment => &self.store.environment_collection,
            SensorGroup::Status => &self.store.status_collection,
        }
    }

    /// Initializes the global logger from the `[logging]` table.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        logging::init_logger(self.log_level()?, self.logging.file.as_deref(), true);
        logging::info(
            Component::System,
            None,
            &format!("Dashboard core starting (timezone {})", self.timezone),
        );
        Ok(())
    }

    /// Firestore-backed assembler for `group`.
    pub fn firestore_assembler(&self, group: SensorGroup) -> Result<RangeAssembler<FirestoreStore>, StoreError> {
        let store = FirestoreStore::new(
            &self.store.base_url,
            &self.store.project_id,
            self.store.api_key.as_deref(),
        )?;
        let tz = self
            .app_timezone()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(RangeAssembler::new(store, tz, group, self.collection_for(group)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL: &str = r#"
timezone = "America/Denver"
manual_expected_interval_ms = 30000

[store]
project_id = "crystal-cove"
status_collection = "cove_status"

[logging]
level = "debug"
file = "covemon.log"
"#;

    #[test]
    fn test_defaults_when_file_is_empty() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.timezone, "America/Los_Angeles");
        assert_eq!(config.collection_for(SensorGroup::Environment), "raccoonbot_data");
        assert_eq!(config.collection_for(SensorGroup::Status), "crystal_cove");
        assert_eq!(config.store.base_url, FIRESTORE_BASE_URL);
    }

    #[test]
    fn test_full_file_overrides_defaults() {
        let config = DashboardConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.app_timezone().unwrap().name(), "America/Denver");
        assert_eq!(config.manual_expected_interval_ms, Some(30_000));
        assert_eq!(config.store.project_id, "crystal-cove");
        assert_eq!(config.collection_for(SensorGroup::Status), "cove_status");
        assert_eq!(config.collection_for(SensorGroup::Environment), "raccoonbot_data");
        assert_eq!(config.log_level().unwrap(), LogLevel::Debug);
        assert_eq!(config.logging.file.as_deref(), Some("covemon.log"));
    }

    #[test]
    fn test_shipped_sample_config_is_valid() {
        let config = DashboardConfig::from_toml_str(include_str!("../covemon.toml")).unwrap();
        assert_eq!(config.store.project_id, "crystal-cove");
        assert_eq!(config.manual_expected_interval_ms, None);
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let err = DashboardConfig::from_toml_str(r#"timezone = "Mars/Olympus_Mons""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone(_)));
    }

    #[test]
    fn test_non_positive_interval_rejected() {
        let err = DashboardConfig::from_toml_str("manual_expected_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval(0)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            DashboardConfig::from_toml_str("timezone = ["),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml_str("[logging]\nlevel = \"loud\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("COVEMON_TIMEZONE", "UTC"),
            ("COVEMON_EXPECTED_INTERVAL_MS", "15000"),
            ("FIRESTORE_PROJECT_ID", "cove-staging"),
            ("FIRESTORE_API_KEY", "abc123"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::from_toml_str(FULL).unwrap();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        config.validate().unwrap();

        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.manual_expected_interval_ms, Some(15_000));
        assert_eq!(config.store.project_id, "cove-staging");
        assert_eq!(config.store.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_numeric_interval_override_is_parse_error() {
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "COVEMON_EXPECTED_INTERVAL_MS").then(|| "every minute".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_config("/nonexistent/covemon.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_firestore_assembler_targets_group_collection() {
        let config = DashboardConfig::from_toml_str(FULL).unwrap();
        let assembler = config.firestore_assembler(SensorGroup::Status).unwrap();
        assert_eq!(assembler.group(), SensorGroup::Status);
    }
}
