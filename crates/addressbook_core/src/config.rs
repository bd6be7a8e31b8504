//! Store and listing configuration
//!
//! Loaded from TOML. Every section has a default so a partial file (or none
//! at all) gives a working in-memory setup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{CoreError, Result, error::ConfigError};

/// Top-level configuration for the address book stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressBookConfig {
    /// Region-restricted PII store
    #[serde(default)]
    pub pii_store: PiiStoreConfig,

    /// General store for location fields and unrestricted contacts
    #[serde(default)]
    pub general_store: GeneralStoreConfig,

    /// Contact listing defaults
    #[serde(default)]
    pub listing: ListingConfig,
}

/// PII store backend selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PiiStoreConfig {
    #[default]
    Memory,
    Http {
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

/// General store backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStoreConfig {
    /// Fabric (database) every query is issued against
    #[serde(default = "default_fabric")]
    pub fabric: String,

    #[serde(default)]
    pub backend: GeneralBackendConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneralBackendConfig {
    #[default]
    Memory,
    /// Embedded SurrealDB; an empty path keeps everything in memory
    Embedded {
        #[serde(default)]
        path: String,
    },
    Http {
        base_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Contacts shown per page
    #[serde(default = "default_per_page")]
    pub contacts_per_page: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fabric() -> String {
    "_system".to_string()
}

fn default_per_page() -> u32 {
    10
}

impl Default for GeneralStoreConfig {
    fn default() -> Self {
        Self {
            fabric: default_fabric(),
            backend: GeneralBackendConfig::default(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            contacts_per_page: default_per_page(),
        }
    }
}

pub(crate) fn timeout(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<AddressBookConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    parse_config(&content, path)
}

/// Parse configuration text; `origin` is only used in error reports
pub fn parse_config(content: &str, origin: &Path) -> Result<AddressBookConfig> {
    toml::from_str(content).map_err(|e| CoreError::ConfigurationError {
        config_path: origin.display().to_string(),
        field: "content".to_string(),
        expected: "valid TOML configuration".to_string(),
        cause: ConfigError::TomlParse(e.to_string()),
    })
}

/// Save configuration to a TOML file
pub async fn save_config(config: &AddressBookConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}
