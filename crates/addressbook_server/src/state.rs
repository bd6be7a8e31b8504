//! Application state

use addressbook_core::ContactRouter;
use std::sync::Arc;
use std::time::Instant;

use crate::{config::ServerConfig, error::ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub contacts: Arc<ContactRouter>,
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,
    pub started_at: Instant,
}

impl AppState {
    /// Build the stores named in the config
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let contacts = ContactRouter::from_config(&config.address_book).await?;
        Ok(Self::with_router(config, contacts))
    }

    pub fn with_router(config: ServerConfig, contacts: ContactRouter) -> Self {
        let jwt_encoding_key = jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let jwt_decoding_key = jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config: Arc::new(config),
            contacts: Arc::new(contacts),
            jwt_encoding_key,
            jwt_decoding_key,
            started_at: Instant::now(),
        }
    }
}
