//! Backing stores for contact data
//!
//! Two collaborators sit behind narrow traits:
//! - [`PiiStore`]: region-restricted storage for name, email and phone
//! - [`QueryExecutor`]: the general store, driven by named parameterized queries
//!
//! [`GeneralStore`] wraps a query executor with typed operations on the user
//! and location tables.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::{self, Display};
use std::sync::Arc;
use thiserror::Error;

use crate::contact::{LocationRow, UserRow, lenient};
use crate::token::ContactToken;

pub mod http;
pub mod memory;
#[cfg(feature = "surreal-embedded")]
pub mod surreal;

/// Errors raised by a store backend
#[derive(Error, Debug, Diagnostic)]
pub enum StoreError {
    #[error("{store} rejected {operation}: {message}")]
    #[diagnostic(code(addressbook_core::store::rejected))]
    Rejected {
        store: String,
        operation: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{store} unreachable during {operation}")]
    #[diagnostic(
        code(addressbook_core::store::unreachable),
        help("Check the {store} endpoint configuration and network access")
    )]
    Unreachable {
        store: String,
        operation: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{store} returned a malformed response to {operation}")]
    #[diagnostic(code(addressbook_core::store::malformed_response))]
    Malformed {
        store: String,
        operation: String,
        body: String,
        #[source]
        cause: serde_json::Error,
    },
}

impl StoreError {
    pub fn rejected(
        store: impl Into<String>,
        operation: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            store: store.into(),
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    pub fn unreachable(
        store: impl Into<String>,
        operation: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unreachable {
            store: store.into(),
            operation: operation.into(),
            cause: Box::new(cause),
        }
    }

    pub fn malformed(
        store: impl Into<String>,
        operation: impl Into<String>,
        body: impl Into<String>,
        cause: serde_json::Error,
    ) -> Self {
        Self::Malformed {
            store: store.into(),
            operation: operation.into(),
            body: body.into(),
            cause,
        }
    }

    pub fn store(&self) -> &str {
        match self {
            Self::Rejected { store, .. }
            | Self::Unreachable { store, .. }
            | Self::Malformed { store, .. } => store,
        }
    }

    /// The underlying message, without the store prefix
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unreachable { cause, .. } => cause.to_string(),
            Self::Malformed { cause, .. } => format!("malformed response: {}", cause),
        }
    }
}

/// What the PII store knows about a contact found by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiRecord {
    #[serde(deserialize_with = "lenient::token")]
    pub token: ContactToken,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PiiRecord {
    pub fn into_user_row(self) -> UserRow {
        UserRow {
            token: self.token,
            name: self.name,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// Region-restricted store for personally identifying fields
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PiiStore: Send + Sync {
    /// Name used in error reports
    fn store_name(&self) -> &'static str;

    /// Store a new record; the store issues the token
    async fn create(&self, name: &str, email: &str, phone: &str)
    -> Result<ContactToken, StoreError>;

    /// Find a record by email. `None` when the store has no match.
    async fn search(&self, email: &str) -> Result<Option<PiiRecord>, StoreError>;

    async fn update(
        &self,
        token: &ContactToken,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<(), StoreError>;

    async fn delete(&self, token: &ContactToken) -> Result<(), StoreError>;
}

/// Named queries understood by the general store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryId {
    UpsertUser,
    UpsertLocation,
    SearchUserByEmail,
    SearchUserByToken,
    SearchLocationByToken,
    GetAllUsers,
    GetAllLocations,
    DeleteUser,
    DeleteLocation,
}

impl QueryId {
    pub const ALL: [QueryId; 9] = [
        QueryId::UpsertUser,
        QueryId::UpsertLocation,
        QueryId::SearchUserByEmail,
        QueryId::SearchUserByToken,
        QueryId::SearchLocationByToken,
        QueryId::GetAllUsers,
        QueryId::GetAllLocations,
        QueryId::DeleteUser,
        QueryId::DeleteLocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryId::UpsertUser => "upsert-user",
            QueryId::UpsertLocation => "upsert-location",
            QueryId::SearchUserByEmail => "search-user-by-email",
            QueryId::SearchUserByToken => "search-user-by-token",
            QueryId::SearchLocationByToken => "search-location-by-token",
            QueryId::GetAllUsers => "get-all-users",
            QueryId::GetAllLocations => "get-all-locations",
            QueryId::DeleteUser => "delete-user",
            QueryId::DeleteLocation => "delete-location",
        }
    }
}

impl Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows returned by a general-store query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub result: Vec<serde_json::Value>,
}

/// Opaque parameterized-query backend for the general store
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Name used in error reports
    fn store_name(&self) -> &'static str;

    async fn execute(
        &self,
        fabric: &str,
        query: QueryId,
        params: serde_json::Value,
    ) -> Result<QueryResult, StoreError>;
}

/// Typed access to the general store's user and location tables
#[derive(Clone)]
pub struct GeneralStore {
    executor: Arc<dyn QueryExecutor>,
    fabric: String,
}

impl fmt::Debug for GeneralStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralStore")
            .field("store", &self.executor.store_name())
            .field("fabric", &self.fabric)
            .finish()
    }
}

impl GeneralStore {
    pub fn new(executor: Arc<dyn QueryExecutor>, fabric: impl Into<String>) -> Self {
        Self {
            executor,
            fabric: fabric.into(),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.executor.store_name()
    }

    pub fn fabric(&self) -> &str {
        &self.fabric
    }

    async fn run(&self, query: QueryId, params: serde_json::Value) -> Result<QueryResult, StoreError> {
        tracing::debug!(fabric = %self.fabric, %query, "executing general store query");
        self.executor.execute(&self.fabric, query, params).await
    }

    fn encode<T: Serialize>(&self, query: QueryId, row: &T) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(row)
            .map_err(|e| StoreError::malformed(self.store_name(), query.as_str(), "", e))
    }

    /// Decode rows. Columns decode leniently, so only a row that is not an
    /// object or has no usable token is skipped.
    fn decode<T: DeserializeOwned>(&self, query: QueryId, rows: Vec<serde_json::Value>) -> Vec<T> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row.clone()) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(%query, row = %row, error = %e, "skipping undecodable row");
                    None
                }
            })
            .collect()
    }

    pub async fn upsert_user(&self, row: &UserRow) -> Result<(), StoreError> {
        let params = self.encode(QueryId::UpsertUser, row)?;
        self.run(QueryId::UpsertUser, params).await.map(|_| ())
    }

    pub async fn upsert_location(&self, row: &LocationRow) -> Result<(), StoreError> {
        let params = self.encode(QueryId::UpsertLocation, row)?;
        self.run(QueryId::UpsertLocation, params).await.map(|_| ())
    }

    pub async fn delete_user(&self, token: &ContactToken) -> Result<(), StoreError> {
        self.run(QueryId::DeleteUser, serde_json::json!({ "token": token }))
            .await
            .map(|_| ())
    }

    pub async fn delete_location(&self, token: &ContactToken) -> Result<(), StoreError> {
        self.run(QueryId::DeleteLocation, serde_json::json!({ "token": token }))
            .await
            .map(|_| ())
    }

    pub async fn search_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        let query = QueryId::SearchUserByEmail;
        let rows = self.run(query, serde_json::json!({ "email": email })).await?;
        Ok(self.decode(query, rows.result).into_iter().next())
    }

    pub async fn search_user_by_token(
        &self,
        token: &ContactToken,
    ) -> Result<Option<UserRow>, StoreError> {
        let query = QueryId::SearchUserByToken;
        let rows = self.run(query, serde_json::json!({ "token": token })).await?;
        Ok(self.decode(query, rows.result).into_iter().next())
    }

    pub async fn search_location_by_token(
        &self,
        token: &ContactToken,
    ) -> Result<Option<LocationRow>, StoreError> {
        let query = QueryId::SearchLocationByToken;
        let rows = self.run(query, serde_json::json!({ "token": token })).await?;
        Ok(self.decode(query, rows.result).into_iter().next())
    }

    pub async fn all_users(&self) -> Result<Vec<UserRow>, StoreError> {
        let query = QueryId::GetAllUsers;
        let rows = self.run(query, serde_json::json!({})).await?;
        Ok(self.decode(query, rows.result))
    }

    pub async fn all_locations(&self) -> Result<Vec<LocationRow>, StoreError> {
        let query = QueryId::GetAllLocations;
        let rows = self.run(query, serde_json::json!({})).await?;
        Ok(self.decode(query, rows.result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryQueryExecutor;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    #[test]
    fn test_query_ids_serialize_as_kebab_case() {
        for query in QueryId::ALL {
            let encoded = serde_json::to_value(query).unwrap();
            assert_eq!(encoded, serde_json::Value::String(query.as_str().to_string()));
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_undecodable_rows_are_skipped() {
        let executor = Arc::new(MemoryQueryExecutor::new());
        let store = GeneralStore::new(executor.clone(), "_system");

        let token = ContactToken::new("gbl_1");
        store
            .upsert_user(&UserRow {
                token: token.clone(),
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                phone: None,
            })
            .await
            .unwrap();

        let rows = store.decode::<UserRow>(
            QueryId::GetAllUsers,
            vec![serde_json::json!(42), serde_json::json!({ "token": "gbl_1" })],
        );
        assert_eq!(rows.len(), 1);
        assert!(logs_contain("skipping undecodable row"));

        let mixed = store.decode::<UserRow>(
            QueryId::GetAllUsers,
            vec![
                serde_json::json!({ "token": "gbl_a", "name": "Ada" }),
                serde_json::json!({ "token": "gbl_b", "name": "Bo", "phone": 5550100 }),
            ],
        );
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed[1].phone.as_deref(), Some("5550100"));

        let found = store.search_user_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.map(|row| row.token), Some(token));
    }
}
