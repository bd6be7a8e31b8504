//! Contact Router
//!
//! Decides which store owns a contact's personal fields and reassembles
//! contacts from both stores on read.
//!
//! Placement is chosen once per operation:
//! - on create, from the contact's country ([`is_private_region`])
//! - on update and delete, from the token ([`ContactToken::is_global`])
//!
//! Location fields always go to the general store, keyed by token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AddressBookConfig, GeneralBackendConfig, PiiStoreConfig, timeout};
use crate::contact::{Contact, ContactForm, LocationRow};
use crate::region::is_private_region;
use crate::store::http::{HttpPiiStore, HttpQueryExecutor};
use crate::store::memory::{MemoryPiiStore, MemoryQueryExecutor};
use crate::store::{GeneralStore, PiiStore, QueryExecutor, StoreError};
use crate::token::ContactToken;
use crate::{CoreError, Result};

/// The store that owns a contact's name, email and phone
#[async_trait]
pub trait Placement: Send + Sync {
    fn store_name(&self) -> &'static str;

    /// Whether this placement keeps personal fields in the restricted region
    fn is_private(&self) -> bool;

    /// Write the personal fields of a new contact and return its token
    async fn create(&self, form: &ContactForm) -> std::result::Result<ContactToken, StoreError>;

    async fn update(
        &self,
        token: &ContactToken,
        form: &ContactForm,
    ) -> std::result::Result<(), StoreError>;

    async fn remove(&self, token: &ContactToken) -> std::result::Result<(), StoreError>;
}

/// Personal fields held by the PII store, which issues the token
pub struct RestrictedPlacement {
    pii: Arc<dyn PiiStore>,
}

#[async_trait]
impl Placement for RestrictedPlacement {
    fn store_name(&self) -> &'static str {
        self.pii.store_name()
    }

    fn is_private(&self) -> bool {
        true
    }

    async fn create(&self, form: &ContactForm) -> std::result::Result<ContactToken, StoreError> {
        let fields = form.personal();
        self.pii
            .create(fields.name, fields.email, fields.phone)
            .await
    }

    async fn update(
        &self,
        token: &ContactToken,
        form: &ContactForm,
    ) -> std::result::Result<(), StoreError> {
        let fields = form.personal();
        self.pii
            .update(token, fields.name, fields.email, fields.phone)
            .await
    }

    async fn remove(&self, token: &ContactToken) -> std::result::Result<(), StoreError> {
        self.pii.delete(token).await
    }
}

/// Personal fields held in the general store's user table under a minted token
pub struct GlobalPlacement {
    general: GeneralStore,
}

#[async_trait]
impl Placement for GlobalPlacement {
    fn store_name(&self) -> &'static str {
        self.general.store_name()
    }

    fn is_private(&self) -> bool {
        false
    }

    async fn create(&self, form: &ContactForm) -> std::result::Result<ContactToken, StoreError> {
        let token = ContactToken::mint_global();
        self.general.upsert_user(&form.user_row(&token)).await?;
        Ok(token)
    }

    async fn update(
        &self,
        token: &ContactToken,
        form: &ContactForm,
    ) -> std::result::Result<(), StoreError> {
        self.general.upsert_user(&form.user_row(token)).await
    }

    async fn remove(&self, token: &ContactToken) -> std::result::Result<(), StoreError> {
        self.general.delete_user(token).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub token: ContactToken,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub token: ContactToken,
    pub is_private: bool,
    /// The submitted country classifies differently from where the
    /// personal fields live; they were left in place
    pub crosses_region: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub token: ContactToken,
    pub is_private: bool,
}

/// A row of an import that could not be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    /// 0-based position in the submitted batch
    pub row: usize,
    pub store: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: Vec<Created>,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ContactRouter {
    pii: Arc<dyn PiiStore>,
    general: GeneralStore,
    restricted: RestrictedPlacement,
    global: GlobalPlacement,
}

impl std::fmt::Debug for ContactRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactRouter")
            .field("pii", &self.pii.store_name())
            .field("general", &self.general)
            .finish()
    }
}

impl ContactRouter {
    pub fn new(pii: Arc<dyn PiiStore>, general: GeneralStore) -> Self {
        Self {
            restricted: RestrictedPlacement { pii: pii.clone() },
            global: GlobalPlacement {
                general: general.clone(),
            },
            pii,
            general,
        }
    }

    /// Build the stores named in `config` and a router over them
    pub async fn from_config(config: &AddressBookConfig) -> Result<Self> {
        let pii: Arc<dyn PiiStore> = match &config.pii_store {
            PiiStoreConfig::Memory => Arc::new(MemoryPiiStore::new()),
            PiiStoreConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => Arc::new(
                HttpPiiStore::new(base_url.clone(), api_key.clone(), timeout(*timeout_secs))
                    .map_err(|cause| CoreError::StoreInitFailed {
                        store: HttpPiiStore::NAME.to_string(),
                        cause,
                    })?,
            ),
        };

        let fabric = config.general_store.fabric.as_str();
        let executor: Arc<dyn QueryExecutor> = match &config.general_store.backend {
            GeneralBackendConfig::Memory => Arc::new(MemoryQueryExecutor::new()),
            GeneralBackendConfig::Embedded { path } => embedded_executor(path, fabric).await?,
            GeneralBackendConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => Arc::new(
                HttpQueryExecutor::new(base_url.clone(), api_key.clone(), timeout(*timeout_secs))
                    .map_err(|cause| CoreError::StoreInitFailed {
                        store: HttpQueryExecutor::NAME.to_string(),
                        cause,
                    })?,
            ),
        };

        tracing::info!(
            pii = pii.store_name(),
            general = executor.store_name(),
            fabric,
            "contact router ready"
        );

        Ok(Self::new(pii, GeneralStore::new(executor, fabric)))
    }

    fn placement_for_country(&self, country: &str) -> &dyn Placement {
        if is_private_region(country) {
            &self.restricted
        } else {
            &self.global
        }
    }

    fn placement_for_token(&self, token: &ContactToken) -> &dyn Placement {
        if token.is_global() {
            &self.global
        } else {
            &self.restricted
        }
    }

    /// Create a contact, placing its personal fields by country
    pub async fn create_contact(&self, form: &ContactForm) -> Result<Created> {
        let placement = self.placement_for_country(&form.country);

        let token = placement
            .create(form)
            .await
            .map_err(|e| CoreError::write_failed("create", e))?;

        if let Err(e) = self.general.upsert_location(&form.location_row(&token)).await {
            let error = CoreError::write_failed("create", e);
            return Err(self.compensate(placement, &token, error).await);
        }

        tracing::debug!(
            token = %token,
            store = placement.store_name(),
            "contact created"
        );

        Ok(Created {
            token,
            is_private: placement.is_private(),
        })
    }

    /// Undo the personal-field write of a create whose location write failed
    async fn compensate(
        &self,
        placement: &dyn Placement,
        token: &ContactToken,
        error: CoreError,
    ) -> CoreError {
        match placement.remove(token).await {
            Ok(()) => {
                tracing::warn!(
                    token = %token,
                    store = placement.store_name(),
                    "location write failed, removed personal record"
                );
                error.with_compensation(format!(
                    "removed {} record {}",
                    placement.store_name(),
                    token
                ))
            }
            Err(e) => {
                tracing::error!(
                    token = %token,
                    store = placement.store_name(),
                    error = %e,
                    "location write failed and personal record could not be removed; record is orphaned"
                );
                error.with_compensation(format!(
                    "could not remove {} record {}: {}",
                    placement.store_name(),
                    token,
                    e.message()
                ))
            }
        }
    }

    /// Look a contact up by email across both stores.
    ///
    /// `Ok(None)` means neither store knows the email.
    pub async fn resolve_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let pii_hit = match self.pii.search(email).await {
            Ok(hit) => hit,
            Err(e @ StoreError::Malformed { .. }) => {
                tracing::warn!(error = %e, "treating malformed pii search response as no match");
                None
            }
            Err(e) => return Err(CoreError::read_failed("search", e)),
        };

        let contact = match pii_hit {
            Some(record) => {
                let token = record.token.clone();
                let pii_contact = Contact::from(record.into_user_row());
                match self.general.search_user_by_token(&token).await {
                    Ok(Some(canonical)) => pii_contact.with_user(canonical),
                    Ok(None) => pii_contact,
                    Err(e) => {
                        tracing::warn!(
                            token = %token,
                            error = %e,
                            "general store user lookup failed, using pii fields only"
                        );
                        pii_contact
                    }
                }
            }
            None => match self.general.search_user_by_email(email).await {
                Ok(Some(user)) => Contact::from(user),
                Ok(None) => return Ok(None),
                Err(e @ StoreError::Malformed { .. }) => {
                    tracing::warn!(error = %e, "treating malformed user search response as no match");
                    return Ok(None);
                }
                Err(e) => return Err(CoreError::read_failed("search", e)),
            },
        };

        let location = self
            .general
            .search_location_by_token(&contact.token)
            .await
            .map_err(|e| CoreError::read_failed("search", e))?;

        Ok(Some(match location {
            Some(location) => contact.with_location(location),
            None => contact,
        }))
    }

    /// Every user row of the general store, joined with its location
    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        let (users, locations) = futures::try_join!(
            async {
                self.general
                    .all_users()
                    .await
                    .map_err(|e| CoreError::read_failed("list", e))
            },
            async {
                self.general
                    .all_locations()
                    .await
                    .map_err(|e| CoreError::read_failed("list", e))
            },
        )?;

        let mut by_token: HashMap<ContactToken, LocationRow> = HashMap::with_capacity(locations.len());
        for location in locations {
            by_token.entry(location.token.clone()).or_insert(location);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let location = by_token.get(&user.token).cloned();
                let contact = Contact::from(user);
                match location {
                    Some(location) => contact.with_location(location),
                    None => contact,
                }
            })
            .collect())
    }

    /// Update a contact in place. Personal fields stay in the store they were
    /// created in, whatever the submitted country.
    pub async fn update_contact(&self, token: &ContactToken, form: &ContactForm) -> Result<Updated> {
        if token.is_empty() {
            return Err(CoreError::MissingToken {
                operation: "update".to_string(),
            });
        }

        let placement = self.placement_for_token(token);
        let crosses_region = is_private_region(&form.country) != placement.is_private();
        if crosses_region {
            tracing::warn!(
                token = %token,
                country = %form.country,
                store = placement.store_name(),
                "country now classifies in the other region; personal fields stay where they are"
            );
        }

        placement
            .update(token, form)
            .await
            .map_err(|e| CoreError::write_failed("update", e))?;
        self.general
            .upsert_location(&form.location_row(token))
            .await
            .map_err(|e| CoreError::write_failed("update", e))?;

        Ok(Updated {
            token: token.clone(),
            is_private: placement.is_private(),
            crosses_region,
        })
    }

    pub async fn delete_contact(&self, token: &ContactToken) -> Result<Deleted> {
        if token.is_empty() {
            return Err(CoreError::MissingToken {
                operation: "delete".to_string(),
            });
        }

        let placement = self.placement_for_token(token);
        placement
            .remove(token)
            .await
            .map_err(|e| CoreError::write_failed("delete", e))?;
        self.general
            .delete_location(token)
            .await
            .map_err(|e| CoreError::write_failed("delete", e))?;

        Ok(Deleted {
            token: token.clone(),
            is_private: placement.is_private(),
        })
    }

    /// Create each contact in turn; a failed row does not stop the batch
    pub async fn import_contacts(&self, forms: &[ContactForm]) -> ImportReport {
        let mut report = ImportReport::default();
        for (row, form) in forms.iter().enumerate() {
            match self.create_contact(form).await {
                Ok(created) => report.created.push(created),
                Err(e) => {
                    tracing::warn!(row, error = %e, "import row failed");
                    report.failures.push(ImportFailure {
                        row,
                        store: e.store().map(str::to_string),
                        message: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            created = report.created.len(),
            failed = report.failures.len(),
            "contact import finished"
        );
        report
    }
}

#[cfg(feature = "surreal-embedded")]
async fn embedded_executor(path: &str, fabric: &str) -> Result<Arc<dyn QueryExecutor>> {
    use crate::store::surreal::SurrealQueryExecutor;

    let endpoint = if path.is_empty() {
        "memory".to_string()
    } else {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CoreError::StoreInitFailed {
                        store: SurrealQueryExecutor::NAME.to_string(),
                        cause: StoreError::unreachable(SurrealQueryExecutor::NAME, "connect", e),
                    }
                })?;
            }
        }
        format!("surrealkv://{}", path)
    };

    let executor = SurrealQueryExecutor::connect(&endpoint, fabric)
        .await
        .map_err(|cause| CoreError::StoreInitFailed {
            store: SurrealQueryExecutor::NAME.to_string(),
            cause,
        })?;
    Ok(Arc::new(executor))
}

#[cfg(not(feature = "surreal-embedded"))]
async fn embedded_executor(_path: &str, _fabric: &str) -> Result<Arc<dyn QueryExecutor>> {
    Err(CoreError::StoreInitFailed {
        store: "general store".to_string(),
        cause: StoreError::rejected(
            "general store",
            "connect",
            None,
            "built without the surreal-embedded feature",
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::UserRow;
    use crate::store::MockPiiStore;
    use crate::store::QueryId;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn router_with(pii: MockPiiStore) -> (ContactRouter, Arc<MemoryQueryExecutor>) {
        let executor = Arc::new(MemoryQueryExecutor::new());
        let general = GeneralStore::new(executor.clone(), "_system");
        (ContactRouter::new(Arc::new(pii), general), executor)
    }

    fn pii_record(token: &str) -> crate::store::PiiRecord {
        crate::store::PiiRecord {
            token: ContactToken::new(token),
            name: Some("Amélie".into()),
            email: Some("amelie@example.fr".into()),
            phone: Some("+33 1".into()),
        }
    }

    #[tokio::test]
    async fn test_pii_hit_prefers_canonical_user_fields() {
        let mut pii = MockPiiStore::new();
        pii.expect_search()
            .returning(|_| Ok(Some(pii_record("opaque-1"))));
        let (router, executor) = router_with(pii);

        executor.seed_user(UserRow {
            token: ContactToken::new("opaque-1"),
            name: Some("Amélie Poulain".into()),
            email: None,
            phone: None,
        });

        let contact = router
            .resolve_contact_by_email("amelie@example.fr")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.name.as_deref(), Some("Amélie Poulain"));
        assert_eq!(contact.email.as_deref(), Some("amelie@example.fr"));
        assert_eq!(
            executor.calls(),
            vec![QueryId::SearchUserByToken, QueryId::SearchLocationByToken]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_pii_hit_falls_back_when_general_lookup_fails() {
        let mut pii = MockPiiStore::new();
        pii.expect_search()
            .returning(|_| Ok(Some(pii_record("opaque-2"))));
        let (router, executor) = router_with(pii);
        executor.fail_on(QueryId::SearchUserByToken);

        let contact = router
            .resolve_contact_by_email("amelie@example.fr")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.token.as_str(), "opaque-2");
        assert_eq!(contact.name.as_deref(), Some("Amélie"));
        assert_eq!(contact.country, None);
        assert!(logs_contain("using pii fields only"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_malformed_pii_search_counts_as_miss() {
        let mut pii = MockPiiStore::new();
        pii.expect_search().returning(|_| {
            let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(StoreError::malformed("pii store", "search", "{", cause))
        });
        let (router, executor) = router_with(pii);

        let found = router.resolve_contact_by_email("ghost@example.com").await.unwrap();
        assert_eq!(found, None);
        assert_eq!(executor.calls(), vec![QueryId::SearchUserByEmail]);
        assert!(logs_contain("treating malformed pii search response as no match"));
    }

    #[tokio::test]
    async fn test_unreachable_pii_search_is_a_read_error() {
        let mut pii = MockPiiStore::new();
        pii.expect_search().returning(|_| {
            Err(StoreError::unreachable(
                "pii store",
                "search",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
            ))
        });
        let (router, _executor) = router_with(pii);

        let err = router
            .resolve_contact_by_email("amelie@example.fr")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StoreReadFailed { ref store, .. } if store == "pii store"));
    }

    #[tokio::test]
    async fn test_restricted_create_never_touches_user_table() {
        let mut pii = MockPiiStore::new();
        pii.expect_store_name().return_const("pii store");
        pii.expect_create()
            .times(1)
            .withf(|name, email, phone| {
                name == "Amélie" && email == "amelie@example.fr" && phone == "+33 1"
            })
            .returning(|_, _, _| Ok(ContactToken::new("opaque-3")));
        let (router, executor) = router_with(pii);

        let form = ContactForm {
            name: "Amélie".into(),
            email: "amelie@example.fr".into(),
            phone: "+33 1".into(),
            country: "fr".into(),
            ..Default::default()
        };
        let created = router.create_contact(&form).await.unwrap();

        assert!(created.is_private);
        assert_eq!(created.token.as_str(), "opaque-3");
        assert_eq!(executor.calls(), vec![QueryId::UpsertLocation]);
    }

    #[tokio::test]
    async fn test_failed_location_write_removes_pii_record() {
        let mut pii = MockPiiStore::new();
        pii.expect_store_name().return_const("pii store");
        pii.expect_create()
            .returning(|_, _, _| Ok(ContactToken::new("opaque-4")));
        pii.expect_delete()
            .times(1)
            .withf(|token| token.as_str() == "opaque-4")
            .returning(|_| Ok(()));
        let (router, executor) = router_with(pii);
        executor.fail_on(QueryId::UpsertLocation);

        let form = ContactForm {
            country: "Germany".into(),
            ..Default::default()
        };
        let err = router.create_contact(&form).await.unwrap_err();
        match err {
            CoreError::StoreWriteFailed {
                store,
                compensation,
                ..
            } => {
                assert_eq!(store, "general store");
                assert_eq!(
                    compensation.as_deref(),
                    Some("removed pii store record opaque-4")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_compensation_is_reported() {
        let mut pii = MockPiiStore::new();
        pii.expect_store_name().return_const("pii store");
        pii.expect_create()
            .returning(|_, _, _| Ok(ContactToken::new("opaque-5")));
        pii.expect_delete()
            .returning(|_| Err(StoreError::rejected("pii store", "delete", Some(500), "locked")));
        let (router, executor) = router_with(pii);
        executor.fail_on(QueryId::UpsertLocation);

        let form = ContactForm {
            country: "Spain".into(),
            ..Default::default()
        };
        let err = router.create_contact(&form).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::StoreWriteFailed { compensation: Some(ref c), .. }
                if c == "could not remove pii store record opaque-5: locked"
        ));
        assert!(logs_contain("record is orphaned"));
    }

    #[tokio::test]
    async fn test_update_routes_by_token_not_country() {
        let mut pii = MockPiiStore::new();
        pii.expect_store_name().return_const("pii store");
        pii.expect_update()
            .times(1)
            .withf(|token, _, _, _| token.as_str() == "opaque-6")
            .returning(|_, _, _, _| Ok(()));
        let (router, executor) = router_with(pii);

        let form = ContactForm {
            name: "Amélie".into(),
            country: "USA".into(),
            ..Default::default()
        };
        let updated = router
            .update_contact(&ContactToken::new("opaque-6"), &form)
            .await
            .unwrap();

        assert!(updated.is_private);
        assert!(updated.crosses_region);
        assert_eq!(executor.calls(), vec![QueryId::UpsertLocation]);
        let location = executor.location(&ContactToken::new("opaque-6")).unwrap();
        assert_eq!(location.country.as_deref(), Some("USA"));
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected_before_any_store_call() {
        let (router, executor) = router_with(MockPiiStore::new());

        let err = router
            .delete_contact(&ContactToken::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingToken { .. }));
        assert!(executor.calls().is_empty());
    }
}
