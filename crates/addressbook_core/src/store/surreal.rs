//! Embedded SurrealDB general store
//!
//! Serves the named general-store queries from a local SurrealDB instance,
//! either in memory or backed by SurrealKV on disk. One instance serves the
//! single fabric it was opened with.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};

use super::{QueryExecutor, QueryId, QueryResult, StoreError};
use crate::contact::{LocationRow, UserRow};

pub struct SurrealQueryExecutor {
    db: Surreal<Any>,
    fabric: String,
}

impl SurrealQueryExecutor {
    pub const NAME: &'static str = "general store";
    const NAMESPACE: &'static str = "addressbook";

    /// Connect to `endpoint` (`memory`, `surrealkv://path`, `ws://host`) and
    /// select `fabric` as the database.
    pub async fn connect(endpoint: &str, fabric: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting general store to {} (fabric {})", endpoint, fabric);
        let connect_start = std::time::Instant::now();

        let db = any::connect(endpoint)
            .await
            .map_err(|e| StoreError::unreachable(Self::NAME, "connect", e))?;
        db.use_ns(Self::NAMESPACE)
            .use_db(fabric)
            .await
            .map_err(|e| StoreError::unreachable(Self::NAME, "connect", e))?;

        tracing::info!(
            "General store connection established in {:?}",
            connect_start.elapsed()
        );

        Ok(Self {
            db,
            fabric: fabric.to_string(),
        })
    }

    pub async fn in_memory(fabric: &str) -> Result<Self, StoreError> {
        Self::connect("memory", fabric).await
    }

    fn statement(query: QueryId) -> &'static str {
        match query {
            QueryId::UpsertUser => {
                "UPSERT type::thing('user', $token) CONTENT { token: $token, name: $name, email: $email, phone: $phone } RETURN NONE"
            }
            QueryId::UpsertLocation => {
                "UPSERT type::thing('location', $token) CONTENT { token: $token, state: $state, country: $country, zipcode: $zipcode, jobTitle: $jobTitle } RETURN NONE"
            }
            QueryId::SearchUserByEmail => {
                "SELECT token, name, email, phone FROM user WHERE email = $email"
            }
            QueryId::SearchUserByToken => {
                "SELECT token, name, email, phone FROM user WHERE token = $token"
            }
            QueryId::SearchLocationByToken => {
                "SELECT token, state, country, zipcode, jobTitle FROM location WHERE token = $token"
            }
            QueryId::GetAllUsers => "SELECT token, name, email, phone FROM user",
            QueryId::GetAllLocations => {
                "SELECT token, state, country, zipcode, jobTitle FROM location"
            }
            QueryId::DeleteUser => "DELETE type::thing('user', $token)",
            QueryId::DeleteLocation => "DELETE type::thing('location', $token)",
        }
    }

    fn take_rows<T: DeserializeOwned + Serialize>(
        query: QueryId,
        response: &mut surrealdb::Response,
    ) -> Result<QueryResult, StoreError> {
        let rows: Vec<T> = response
            .take(0)
            .map_err(|e| StoreError::unreachable(Self::NAME, query.as_str(), e))?;

        let result = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::malformed(Self::NAME, query.as_str(), "", e))?;

        Ok(QueryResult { result })
    }
}

#[async_trait]
impl QueryExecutor for SurrealQueryExecutor {
    fn store_name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        fabric: &str,
        query: QueryId,
        params: serde_json::Value,
    ) -> Result<QueryResult, StoreError> {
        if fabric != self.fabric {
            return Err(StoreError::rejected(
                Self::NAME,
                query.as_str(),
                Some(404),
                format!("unknown fabric '{}'", fabric),
            ));
        }

        let mut surreal_query = self.db.query(Self::statement(query));

        if let serde_json::Value::Object(map) = params {
            for (name, value) in map {
                surreal_query = surreal_query.bind((name, value));
            }
        }

        let mut response = surreal_query
            .await
            .map_err(|e| StoreError::unreachable(Self::NAME, query.as_str(), e))?;

        match query {
            QueryId::SearchUserByEmail | QueryId::SearchUserByToken | QueryId::GetAllUsers => {
                Self::take_rows::<UserRow>(query, &mut response)
            }
            QueryId::SearchLocationByToken | QueryId::GetAllLocations => {
                Self::take_rows::<LocationRow>(query, &mut response)
            }
            QueryId::UpsertUser
            | QueryId::UpsertLocation
            | QueryId::DeleteUser
            | QueryId::DeleteLocation => {
                response.check().map_err(|e| {
                    StoreError::rejected(Self::NAME, query.as_str(), None, e.to_string())
                })?;
                Ok(QueryResult::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::UserRow;
    use crate::store::GeneralStore;
    use crate::token::ContactToken;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn store() -> GeneralStore {
        let executor = SurrealQueryExecutor::in_memory("_system").await.unwrap();
        GeneralStore::new(Arc::new(executor), "_system")
    }

    #[tokio::test]
    async fn test_upsert_and_lookup_round_trip() {
        let store = store().await;
        let token = ContactToken::mint_global();

        store
            .upsert_user(&UserRow {
                token: token.clone(),
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                phone: Some("555".into()),
            })
            .await
            .unwrap();
        store
            .upsert_location(&LocationRow {
                token: token.clone(),
                state: Some("CA".into()),
                country: Some("USA".into()),
                zipcode: Some("94016".into()),
                job_title: Some("Engineer".into()),
            })
            .await
            .unwrap();

        let user = store.search_user_by_email("ada@example.com").await.unwrap();
        assert_eq!(user.map(|u| u.token), Some(token.clone()));

        let location = store.search_location_by_token(&token).await.unwrap().unwrap();
        assert_eq!(location.job_title.as_deref(), Some("Engineer"));

        assert_eq!(store.all_users().await.unwrap().len(), 1);
        assert_eq!(store.all_locations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_rows() {
        let store = store().await;
        let token = ContactToken::mint_global();
        store
            .upsert_user(&UserRow {
                token: token.clone(),
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                phone: None,
            })
            .await
            .unwrap();

        store.delete_user(&token).await.unwrap();
        assert!(store.search_user_by_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_fabrics_are_rejected() {
        let executor = SurrealQueryExecutor::in_memory("_system").await.unwrap();
        let err = executor
            .execute("tenant-b", QueryId::GetAllUsers, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: Some(404), .. }));
    }
}
