//! # Clinic Configuration
//!
//! Configuration for the storage layer and dashboard defaults.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     CLINIC_DATABASE_PATH=/srv/clinic/clinic.db                          │
//! │     CLINIC_LOG=debug                                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/clinic-ledger/clinic.toml (Linux)                         │
//! │     ~/Library/Application Support/com.clinic.clinic-ledger/clinic.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # clinic.toml
//! [database]
//! path = "/srv/clinic/clinic.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//!
//! [dashboard]
//! patient_search_limit = 50
//! ranking_top_n = 5
//! chart_months = 12
//!
//! [logging]
//! filter = "info,clinic_db=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use clinic_core::{DEFAULT_PATIENT_SEARCH_LIMIT, RANKING_TOP_N};

use crate::error::{ConfigError, ConfigResult};
use crate::pool::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the database lives and how the pool is sized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite file. Created on first connect.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool acquire timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "clinic", "clinic-ledger")
        .map(|dirs| dirs.data_dir().join("clinic.db"))
        .unwrap_or_else(|| PathBuf::from("clinic.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: default_true(),
        }
    }
}

// =============================================================================
// Dashboard Settings
// =============================================================================

/// Presentation defaults the dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Maximum patients returned by the procedure form search.
    #[serde(default = "default_search_limit")]
    pub patient_search_limit: u32,

    /// Procedures shown in the ranking pie chart.
    #[serde(default = "default_top_n")]
    pub ranking_top_n: usize,

    /// Months covered by the revenue evolution chart.
    #[serde(default = "default_chart_months")]
    pub chart_months: u32,
}

fn default_search_limit() -> u32 {
    DEFAULT_PATIENT_SEARCH_LIMIT
}

fn default_top_n() -> usize {
    RANKING_TOP_N
}

fn default_chart_months() -> u32 {
    12
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            patient_search_limit: default_search_limit(),
            ranking_top_n: default_top_n(),
            chart_months: default_chart_months(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Clinic Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ClinicConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (clinic.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading clinic config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load clinic config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Clinic config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.dashboard.chart_months == 0 || self.dashboard.chart_months > 120 {
            return Err(ConfigError::Invalid(
                "dashboard.chart_months must be between 1 and 120".into(),
            ));
        }

        if self.dashboard.patient_search_limit == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.patient_search_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("CLINIC_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("CLINIC_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid CLINIC_MAX_CONNECTIONS"),
            }
        }

        if let Ok(limit) = std::env::var("CLINIC_PATIENT_SEARCH_LIMIT") {
            if let Ok(n) = limit.parse::<u32>() {
                self.dashboard.patient_search_limit = n;
            }
        }

        if let Ok(filter) = std::env::var("CLINIC_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "clinic", "clinic-ledger")
            .map(|dirs| dirs.config_dir().join("clinic.toml"))
    }

    /// Builds the pool configuration.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .run_migrations(self.database.run_migrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClinicConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dashboard.patient_search_limit, 50);
        assert_eq!(config.dashboard.ranking_top_n, 5);
        assert!(config.database.path.ends_with("clinic.db"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [database]
            path = "/tmp/clinic-test.db"
            max_connections = 2
        "#;

        let config: ClinicConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/clinic-test.db"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.min_connections, 1);
        assert!(config.database.run_migrations);
        assert_eq!(config.dashboard.chart_months, 12);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = ClinicConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();

        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[dashboard]"));

        let parsed: ClinicConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.database.path, config.database.path);
    }

    #[test]
    fn test_validation_rejects_bad_pool() {
        let mut config = ClinicConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClinicConfig::default();
        config.database.min_connections = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("clinic-{}.toml", uuid::Uuid::new_v4()));

        let mut config = ClinicConfig::default();
        config.dashboard.chart_months = 6;
        config.save(Some(path.clone())).unwrap();

        let loaded: ClinicConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.dashboard.chart_months, 6);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_to_db_config() {
        let mut config = ClinicConfig::default();
        config.database.max_connections = 3;
        config.database.connect_timeout_secs = 7;

        let db = config.to_db_config();
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.connect_timeout, Duration::from_secs(7));
        assert!(db.run_migrations);
    }
}
