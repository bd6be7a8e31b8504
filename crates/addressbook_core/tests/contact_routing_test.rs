use addressbook_core::store::{QueryExecutor, QueryId, QueryResult, StoreError};
use async_trait::async_trait;
use addressbook_core::store::memory::{MemoryPiiStore, MemoryQueryExecutor};
use addressbook_core::{
    ContactForm, ContactRouter, ContactToken, CoreError, GeneralStore, LocationRow, UserRow,
    is_private_region,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    router: ContactRouter,
    pii: Arc<MemoryPiiStore>,
    general: Arc<MemoryQueryExecutor>,
}

fn harness() -> Harness {
    let pii = Arc::new(MemoryPiiStore::new());
    let general = Arc::new(MemoryQueryExecutor::new());
    let router = ContactRouter::new(
        pii.clone(),
        GeneralStore::new(general.clone(), "_system"),
    );
    Harness {
        router,
        pii,
        general,
    }
}

fn form(name: &str, email: &str, country: &str) -> ContactForm {
    ContactForm {
        name: name.to_string(),
        email: email.to_string(),
        phone: "+1 555 0100".to_string(),
        state: "North".to_string(),
        country: country.to_string(),
        zipcode: "10001".to_string(),
        job_title: "Engineer".to_string(),
    }
}

#[test]
fn test_classification_ignores_case_and_accepts_codes() {
    for country in ["France", "FRANCE", "france", "FR", "fr", "Norway", "no"] {
        assert!(is_private_region(country), "{country} should be restricted");
    }
    for country in ["USA", "US", "India", "Switzerland", "", "Fra nce", " France"] {
        assert!(!is_private_region(country), "{country} should not be restricted");
    }
}

#[tokio::test]
async fn test_restricted_create_goes_to_pii_store() {
    let h = harness();

    let created = h
        .router
        .create_contact(&form("Amélie", "amelie@example.fr", "France"))
        .await
        .unwrap();

    assert!(created.is_private);
    assert!(!created.token.is_global());
    assert_eq!(h.pii.len(), 1);
    assert!(!h.general.calls().contains(&QueryId::UpsertUser));
    assert!(h.general.user(&created.token).is_none());

    let location = h.general.location(&created.token).unwrap();
    assert_eq!(location.country.as_deref(), Some("France"));
}

#[tokio::test]
async fn test_global_create_mints_prefixed_token() {
    let h = harness();

    let created = h
        .router
        .create_contact(&form("Ada", "ada@example.com", "USA"))
        .await
        .unwrap();

    assert!(!created.is_private);
    assert!(created.token.as_str().starts_with("gbl_"));
    assert!(h.pii.calls().is_empty());

    let user = h.general.user(&created.token).unwrap();
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(
        h.general.calls(),
        vec![QueryId::UpsertUser, QueryId::UpsertLocation]
    );
}

#[tokio::test]
async fn test_resolve_returns_submitted_location_fields() {
    let h = harness();

    for (email, country) in [("amelie@example.fr", "France"), ("ada@example.com", "USA")] {
        let submitted = form("Someone", email, country);
        let created = h.router.create_contact(&submitted).await.unwrap();

        let contact = h
            .router
            .resolve_contact_by_email(email)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(contact.token, created.token);
        assert_eq!(contact.email.as_deref(), Some(email));
        assert_eq!(contact.state.as_deref(), Some("North"));
        assert_eq!(contact.country.as_deref(), Some(country));
        assert_eq!(contact.zipcode.as_deref(), Some("10001"));
        assert_eq!(contact.job_title.as_deref(), Some("Engineer"));
    }
}

#[tokio::test]
async fn test_resolving_unknown_email_is_empty() {
    let h = harness();
    h.router
        .create_contact(&form("Ada", "ada@example.com", "USA"))
        .await
        .unwrap();

    let found = h
        .router
        .resolve_contact_by_email("ghost@example.com")
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_list_keeps_users_without_locations() {
    let h = harness();
    let located = ContactToken::new("gbl_located");
    let bare = ContactToken::new("gbl_bare");

    h.general.seed_user(UserRow {
        token: located.clone(),
        name: Some("Ada".into()),
        email: Some("ada@example.com".into()),
        phone: None,
    });
    h.general.seed_user(UserRow {
        token: bare.clone(),
        name: Some("Grace".into()),
        email: Some("grace@example.com".into()),
        phone: None,
    });
    h.general.seed_location(LocationRow {
        token: located.clone(),
        state: Some("CA".into()),
        country: Some("USA".into()),
        zipcode: None,
        job_title: None,
    });
    h.general.seed_location(LocationRow {
        token: ContactToken::new("orphan"),
        state: None,
        country: Some("USA".into()),
        zipcode: None,
        job_title: None,
    });

    let mut contacts = h.router.list_contacts().await.unwrap();
    contacts.sort_by(|a, b| a.token.cmp(&b.token));

    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].token, bare);
    assert_eq!(contacts[0].country, None);
    assert_eq!(contacts[0].state, None);
    assert_eq!(contacts[1].token, located);
    assert_eq!(contacts[1].country.as_deref(), Some("USA"));
}

#[tokio::test]
async fn test_list_fails_whole_when_locations_fail() {
    let h = harness();
    h.router
        .create_contact(&form("Ada", "ada@example.com", "USA"))
        .await
        .unwrap();
    h.general.fail_on(QueryId::GetAllLocations);

    let err = h.router.list_contacts().await.unwrap_err();
    assert!(matches!(err, CoreError::StoreReadFailed { .. }));
}

#[tokio::test]
async fn test_failed_location_write_leaves_no_orphan() {
    let h = harness();
    h.general.fail_on(QueryId::UpsertLocation);

    let err = h
        .router
        .create_contact(&form("Ada", "ada@example.com", "USA"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::StoreWriteFailed { compensation: Some(_), .. }
    ));
    assert!(h.router.list_contacts().await.unwrap().is_empty());

    let err = h
        .router
        .create_contact(&form("Amélie", "amelie@example.fr", "France"))
        .await
        .unwrap_err();
    assert_eq!(err.store(), Some("general store"));
    assert!(h.pii.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_follow_the_token() {
    let h = harness();
    let private = h
        .router
        .create_contact(&form("Amélie", "amelie@example.fr", "France"))
        .await
        .unwrap();
    let global = h
        .router
        .create_contact(&form("Ada", "ada@example.com", "USA"))
        .await
        .unwrap();

    let mut moved = form("Amélie", "amelie@example.fr", "Canada");
    moved.job_title = "Director".into();
    let updated = h.router.update_contact(&private.token, &moved).await.unwrap();
    assert!(updated.is_private);
    assert!(updated.crosses_region);
    assert!(h.general.user(&private.token).is_none());
    assert_eq!(
        h.general
            .location(&private.token)
            .and_then(|l| l.job_title),
        Some("Director".to_string())
    );

    let updated = h
        .router
        .update_contact(&global.token, &form("Ada L.", "ada@example.com", "USA"))
        .await
        .unwrap();
    assert!(!updated.is_private);
    assert!(!updated.crosses_region);
    assert_eq!(
        h.general.user(&global.token).and_then(|u| u.name),
        Some("Ada L.".to_string())
    );

    let deleted = h.router.delete_contact(&private.token).await.unwrap();
    assert!(deleted.is_private);
    assert!(h.pii.get(&private.token).is_none());
    assert!(h.general.location(&private.token).is_none());

    h.router.delete_contact(&global.token).await.unwrap();
    assert!(h.router.list_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_reports_each_failed_row() {
    let h = harness();
    h.pii.fail_on("create");

    let report = h
        .router
        .import_contacts(&[
            form("Ada", "ada@example.com", "USA"),
            form("Amélie", "amelie@example.fr", "France"),
            form("Grace", "grace@example.com", "Canada"),
        ])
        .await;

    assert!(!report.is_complete());
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row, 1);
    assert_eq!(report.failures[0].store.as_deref(), Some("pii store"));
    assert_eq!(h.router.list_contacts().await.unwrap().len(), 2);
}

/// General store whose rows come back with loosely typed columns
struct LooselyTypedRows;

#[async_trait]
impl QueryExecutor for LooselyTypedRows {
    fn store_name(&self) -> &'static str {
        "general store"
    }

    async fn execute(
        &self,
        _fabric: &str,
        query: QueryId,
        _params: serde_json::Value,
    ) -> Result<QueryResult, StoreError> {
        let result = match query {
            QueryId::GetAllUsers => vec![
                serde_json::json!({ "token": "gbl_a", "name": "Ada", "phone": "+1 555 0100" }),
                serde_json::json!({ "token": "gbl_b", "name": "Bo", "phone": 5550100 }),
            ],
            QueryId::GetAllLocations => vec![
                serde_json::json!({ "token": "gbl_b", "country": "USA", "zipcode": 10001 }),
            ],
            _ => Vec::new(),
        };
        Ok(QueryResult { result })
    }
}

#[tokio::test]
async fn test_list_keeps_rows_with_numeric_columns() {
    let router = ContactRouter::new(
        Arc::new(MemoryPiiStore::new()),
        GeneralStore::new(Arc::new(LooselyTypedRows), "_system"),
    );

    let contacts = router.list_contacts().await.unwrap();
    assert_eq!(contacts.len(), 2);

    let bo = contacts
        .iter()
        .find(|c| c.token.as_str() == "gbl_b")
        .unwrap();
    assert_eq!(bo.phone.as_deref(), Some("5550100"));
    assert_eq!(bo.country.as_deref(), Some("USA"));
    assert_eq!(bo.zipcode.as_deref(), Some("10001"));
}
