//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration. Every section falls back to its defaults, so a
/// partial (or missing) config file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorSettings,
    pub morpho: MorphoSettings,
    pub storage: StorageSettings,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings::default(),
            morpho: MorphoSettings::default(),
            storage: StorageSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Poll-cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Minutes between poll cycles.
    pub check_interval_minutes: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval_minutes: 60,
        }
    }
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes * 60)
    }
}

/// Market data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphoSettings {
    /// GraphQL endpoint.
    pub api_url: String,
    /// Page size for the bulk market listing.
    pub page_size: u32,
    /// Chain the listing is filtered to.
    pub chain_id: u32,
}

impl Default for MorphoSettings {
    fn default() -> Self {
        Self {
            api_url: "https://blue-api.morpho.org/graphql".to_string(),
            page_size: 1000,
            chain_id: 1,
        }
    }
}

/// Vault and rate persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding vaults.json and rates.json.
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// Load configuration. A missing file falls back to defaults so the binary
/// can run from flags alone.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}
