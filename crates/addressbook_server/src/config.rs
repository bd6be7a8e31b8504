//! Server configuration

use addressbook_core::AddressBookConfig;
use addressbook_core::region::DataCenter;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ServerError, ServerResult};

/// Environment variable overriding `jwt_secret`
pub const JWT_SECRET_ENV: &str = "ADDRESSBOOK_JWT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,

    /// JWT secret for signing session tokens
    pub jwt_secret: String,

    /// Session lifetime
    pub session_ttl: u64, // seconds

    /// The operator allowed to log in
    pub operator: OperatorConfig,

    /// Where this deployment runs; reported by the session endpoint
    pub data_center: Option<DataCenter>,

    /// CORS configuration
    pub cors: CorsConfig,

    /// Stores and listing
    pub address_book: AddressBookConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub username: String,
    /// Argon2 PHC string; an empty hash disables login
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` allows any origin
    pub allowed_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            jwt_secret: "change-me-in-production".to_string(),
            session_ttl: 3600, // 1 hour
            operator: OperatorConfig {
                username: "admin".to_string(),
                password_hash: String::new(),
            },
            data_center: None,
            cors: CorsConfig::default(),
            address_book: AddressBookConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age: 3600,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file, then apply environment overrides
    pub async fn load(path: &Path) -> ServerResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            if !secret.is_empty() {
                tracing::debug!("Using JWT secret from {}", JWT_SECRET_ENV);
                self.jwt_secret = secret;
            }
        }
        self
    }
}
