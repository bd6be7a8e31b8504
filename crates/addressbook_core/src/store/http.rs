//! HTTP clients for remote PII and general stores

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use super::{PiiRecord, PiiStore, QueryExecutor, QueryId, QueryResult, StoreError};
use crate::token::ContactToken;

fn build_client(store: &'static str, timeout: Duration) -> Result<Client, StoreError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| StoreError::unreachable(store, "connect", e))
}

/// Send a request and return the response body, turning non-2xx into `Rejected`
async fn send(
    store: &'static str,
    operation: &str,
    request: RequestBuilder,
) -> Result<String, StoreError> {
    let response = request
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(|e| StoreError::unreachable(store, operation, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::unreachable(store, operation, e))?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        return Err(StoreError::rejected(
            store,
            operation,
            Some(status.as_u16()),
            message,
        ));
    }

    Ok(body)
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    token: Option<ContactToken>,
}

/// Client for a PII store speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpPiiStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpPiiStore {
    pub const NAME: &'static str = "pii store";

    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: build_client(Self::NAME, timeout)?,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    fn record_url(&self, token: &ContactToken) -> String {
        format!("{}/contacts/{}", self.base_url, token)
    }
}

/// Parse a PII search response. Anything without a token is a miss; other
/// fields that fail to decode are dropped and the hit is kept.
pub(crate) fn parse_search_body(body: &str) -> Option<PiiRecord> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) if value.get("token").is_some_and(|t| !t.is_null()) => {
            match serde_json::from_value::<PiiRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "pii search response has an unusable token");
                    None
                }
            }
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, body = %body, "could not parse pii search response");
            None
        }
    }
}

#[async_trait]
impl PiiStore for HttpPiiStore {
    fn store_name(&self) -> &'static str {
        Self::NAME
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<ContactToken, StoreError> {
        let request = self
            .client
            .post(format!("{}/contacts", self.base_url))
            .json(&serde_json::json!({ "name": name, "email": email, "phone": phone }));
        let body = send(Self::NAME, "create", self.authorize(request)).await?;

        let parsed: TokenBody = serde_json::from_str(&body)
            .map_err(|e| StoreError::malformed(Self::NAME, "create", body.clone(), e))?;
        parsed
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StoreError::rejected(Self::NAME, "create", None, "no token issued"))
    }

    async fn search(&self, email: &str) -> Result<Option<PiiRecord>, StoreError> {
        let request = self
            .client
            .post(format!("{}/contacts/search", self.base_url))
            .json(&serde_json::json!({ "email": email }));
        let body = send(Self::NAME, "search", self.authorize(request)).await?;
        Ok(parse_search_body(&body))
    }

    async fn update(
        &self,
        token: &ContactToken,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .put(self.record_url(token))
            .json(&serde_json::json!({ "name": name, "email": email, "phone": phone }));
        send(Self::NAME, "update", self.authorize(request)).await?;
        Ok(())
    }

    async fn delete(&self, token: &ContactToken) -> Result<(), StoreError> {
        let request = self.client.delete(self.record_url(token));
        send(Self::NAME, "delete", self.authorize(request)).await?;
        Ok(())
    }
}

/// Client for a general store exposing named query workers over HTTP
#[derive(Debug, Clone)]
pub struct HttpQueryExecutor {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpQueryExecutor {
    pub const NAME: &'static str = "general store";

    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: build_client(Self::NAME, timeout)?,
        })
    }

    fn query_url(&self, fabric: &str, query: QueryId) -> String {
        format!("{}/fabrics/{}/queries/{}", self.base_url, fabric, query)
    }
}

#[async_trait]
impl QueryExecutor for HttpQueryExecutor {
    fn store_name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        fabric: &str,
        query: QueryId,
        params: serde_json::Value,
    ) -> Result<QueryResult, StoreError> {
        let mut request = self
            .client
            .post(self.query_url(fabric, query))
            .json(&serde_json::json!({ "bindVars": params }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let body = send(Self::NAME, query.as_str(), request).await?;
        if body.trim().is_empty() {
            return Ok(QueryResult::default());
        }
        serde_json::from_str(&body)
            .map_err(|e| StoreError::malformed(Self::NAME, query.as_str(), body.clone(), e))
    }
}
