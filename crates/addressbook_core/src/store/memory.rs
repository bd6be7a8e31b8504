//! In-memory store backends
//!
//! Used for local development and tests. Both keep a log of the operations
//! they served and can be told to fail specific operations.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;

use super::{PiiRecord, PiiStore, QueryExecutor, QueryId, QueryResult, StoreError};
use crate::contact::{LocationRow, UserRow};
use crate::token::ContactToken;

/// In-memory PII store issuing opaque tokens
#[derive(Debug, Default)]
pub struct MemoryPiiStore {
    records: DashMap<ContactToken, PiiRecord>,
    calls: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryPiiStore {
    pub const NAME: &'static str = "pii store";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` (`create`, `search`, `update`, `delete`) fail
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    /// Operations served so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, token: &ContactToken) -> Option<PiiRecord> {
        self.records.get(token).map(|entry| entry.value().clone())
    }

    fn enter(&self, operation: &'static str) -> Result<(), StoreError> {
        self.calls.lock().push(operation);
        if self.failing.lock().contains(operation) {
            return Err(StoreError::rejected(
                Self::NAME,
                operation,
                Some(503),
                format!("{} unavailable", operation),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PiiStore for MemoryPiiStore {
    fn store_name(&self) -> &'static str {
        Self::NAME
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<ContactToken, StoreError> {
        self.enter("create")?;
        let token = ContactToken::new(uuid::Uuid::new_v4().simple().to_string());
        self.records.insert(
            token.clone(),
            PiiRecord {
                token: token.clone(),
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
            },
        );
        Ok(token)
    }

    async fn search(&self, email: &str) -> Result<Option<PiiRecord>, StoreError> {
        self.enter("search")?;
        Ok(self
            .records
            .iter()
            .find(|entry| entry.value().email.as_deref() == Some(email))
            .map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        token: &ContactToken,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<(), StoreError> {
        self.enter("update")?;
        let mut record = self.records.get_mut(token).ok_or_else(|| {
            StoreError::rejected(Self::NAME, "update", Some(404), "no such record")
        })?;
        record.name = Some(name.to_string());
        record.email = Some(email.to_string());
        record.phone = Some(phone.to_string());
        Ok(())
    }

    async fn delete(&self, token: &ContactToken) -> Result<(), StoreError> {
        self.enter("delete")?;
        self.records.remove(token);
        Ok(())
    }
}

/// In-memory general store with user and location tables keyed by token
#[derive(Debug, Default)]
pub struct MemoryQueryExecutor {
    users: DashMap<ContactToken, UserRow>,
    locations: DashMap<ContactToken, LocationRow>,
    calls: Mutex<Vec<QueryId>>,
    failing: Mutex<HashSet<QueryId>>,
}

impl MemoryQueryExecutor {
    pub const NAME: &'static str = "general store";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later execution of `query` fail
    pub fn fail_on(&self, query: QueryId) {
        self.failing.lock().insert(query);
    }

    /// Queries executed so far, in order
    pub fn calls(&self) -> Vec<QueryId> {
        self.calls.lock().clone()
    }

    pub fn user(&self, token: &ContactToken) -> Option<UserRow> {
        self.users.get(token).map(|entry| entry.value().clone())
    }

    pub fn location(&self, token: &ContactToken) -> Option<LocationRow> {
        self.locations.get(token).map(|entry| entry.value().clone())
    }

    /// Insert a user row directly, bypassing the query log
    pub fn seed_user(&self, row: UserRow) {
        self.users.insert(row.token.clone(), row);
    }

    /// Insert a location row directly, bypassing the query log
    pub fn seed_location(&self, row: LocationRow) {
        self.locations.insert(row.token.clone(), row);
    }

    fn parse<T: serde::de::DeserializeOwned>(
        query: QueryId,
        params: serde_json::Value,
    ) -> Result<T, StoreError> {
        let body = params.to_string();
        serde_json::from_value(params)
            .map_err(|e| StoreError::malformed(Self::NAME, query.as_str(), body, e))
    }

    fn token_param(query: QueryId, params: &serde_json::Value) -> Result<ContactToken, StoreError> {
        params
            .get("token")
            .and_then(|token| token.as_str())
            .map(ContactToken::from)
            .ok_or_else(|| StoreError::rejected(Self::NAME, query.as_str(), Some(400), "missing token"))
    }

    fn rows<T: serde::Serialize>(rows: impl IntoIterator<Item = T>) -> QueryResult {
        QueryResult {
            result: rows
                .into_iter()
                .filter_map(|row| serde_json::to_value(row).ok())
                .collect(),
        }
    }
}

#[async_trait]
impl QueryExecutor for MemoryQueryExecutor {
    fn store_name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        _fabric: &str,
        query: QueryId,
        params: serde_json::Value,
    ) -> Result<QueryResult, StoreError> {
        self.calls.lock().push(query);
        if self.failing.lock().contains(&query) {
            return Err(StoreError::rejected(
                Self::NAME,
                query.as_str(),
                Some(503),
                format!("{} unavailable", query),
            ));
        }

        let result = match query {
            QueryId::UpsertUser => {
                let row: UserRow = Self::parse(query, params)?;
                self.users.insert(row.token.clone(), row);
                QueryResult::default()
            }
            QueryId::UpsertLocation => {
                let row: LocationRow = Self::parse(query, params)?;
                self.locations.insert(row.token.clone(), row);
                QueryResult::default()
            }
            QueryId::SearchUserByEmail => {
                let email = params.get("email").and_then(|email| email.as_str());
                Self::rows(
                    self.users
                        .iter()
                        .filter(|entry| entry.value().email.as_deref() == email)
                        .map(|entry| entry.value().clone()),
                )
            }
            QueryId::SearchUserByToken => {
                let token = Self::token_param(query, &params)?;
                Self::rows(self.user(&token))
            }
            QueryId::SearchLocationByToken => {
                let token = Self::token_param(query, &params)?;
                Self::rows(self.location(&token))
            }
            QueryId::GetAllUsers => {
                Self::rows(self.users.iter().map(|entry| entry.value().clone()))
            }
            QueryId::GetAllLocations => {
                Self::rows(self.locations.iter().map(|entry| entry.value().clone()))
            }
            QueryId::DeleteUser => {
                let token = Self::token_param(query, &params)?;
                self.users.remove(&token);
                QueryResult::default()
            }
            QueryId::DeleteLocation => {
                let token = Self::token_param(query, &params)?;
                self.locations.remove(&token);
                QueryResult::default()
            }
        };

        Ok(result)
    }
}
