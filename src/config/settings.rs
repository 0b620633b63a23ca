use clap::ArgMatches;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::billing::NegativeUsagePolicy;
use crate::utils::error::BillingError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: SqliteConfig,
    pub billing: BillingConfig,
    pub export: ExportConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub database_path: String,
    pub busy_timeout_ms: u64,
    pub enable_wal: bool,
    pub sync_mode: String,
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: "utilities.db".to_string(),
            busy_timeout_ms: 5000,
            enable_wal: true,
            sync_mode: "NORMAL".to_string(),
            max_connections: 1,
        }
    }
}

impl SqliteConfig {
    pub fn in_memory() -> Self {
        Self {
            database_path: ":memory:".to_string(),
            enable_wal: false,
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub negative_usage: NegativeUsagePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub csv_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_path: "payments.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "console".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `--config` when given, otherwise defaults, then apply the
    /// remaining command line overrides.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, BillingError> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_matches(matches);
        Ok(config)
    }

    pub fn apply_matches(&mut self, matches: &ArgMatches) {
        if let Some(database) = matches.get_one::<String>("database") {
            self.database.database_path = database.clone();
        }

        if let Some(format) = matches.get_one::<String>("format") {
            self.output.default_format = format.clone();
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BillingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BillingError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;

        info!("📄 Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), BillingError> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.database_path, "utilities.db");
        assert_eq!(config.billing.negative_usage, NegativeUsagePolicy::Reject);
        assert_eq!(config.export.csv_path, "payments.csv");
        assert_eq!(config.output.default_format, "console");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            database_path = "data/flat.db"

            [billing]
            negative_usage = "allow"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.database_path, "data/flat.db");
        assert!(config.database.enable_wal);
        assert_eq!(config.billing.negative_usage, NegativeUsagePolicy::Allow);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("billing.toml");

        let mut config = Config::default();
        config.export.csv_path = "out/ledger.csv".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.export.csv_path, "out/ledger.csv");
        assert_eq!(loaded.database.sync_mode, "NORMAL");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/billing.toml").unwrap_err();
        assert!(matches!(err, BillingError::ConfigError(_)));
    }
}
