//! Contact loader and form actions

use addressbook_api::{
    ApiError,
    requests::{ContactActionForm, ContactsQuery, FormAction},
    responses::{ActionResult, ContactsPage},
};
use addressbook_core::listing::{SortDirection, displayable, paginate, sort_by_name};
use axum::{
    Form, Json,
    extract::{Query, State},
};

use crate::state::AppState;

/// Search by email when one is given, otherwise list everything; then
/// filter, sort and paginate.
pub async fn load_contacts(
    State(state): State<AppState>,
    Query(query): Query<ContactsQuery>,
) -> Result<Json<ContactsPage>, ApiError> {
    let contacts = match query.search_email() {
        Some(email) => state
            .contacts
            .resolve_contact_by_email(email)
            .await?
            .into_iter()
            .collect(),
        None => state.contacts.list_contacts().await?,
    };

    let mut contacts = displayable(contacts);
    if let Some(direction) = query.sort {
        sort_by_name(&mut contacts, direction);
    }

    let per_page = query
        .limit
        .unwrap_or(state.config.address_book.listing.contacts_per_page);
    let page = paginate(contacts, query.page.unwrap_or(1), per_page);

    Ok(Json(ContactsPage {
        contacts: page.into(),
        sort: query.sort,
        next_sort: SortDirection::toggle(query.sort),
    }))
}

/// Dispatch a submitted form on its `_action` field
pub async fn contact_action(
    State(state): State<AppState>,
    Form(form): Form<ContactActionForm>,
) -> Json<ActionResult> {
    let router = &state.contacts;

    let result = match form.action() {
        Some(FormAction::Create) => match router.create_contact(&form.contact_form()).await {
            Ok(created) => ActionResult::added(created),
            Err(e) => ActionResult::from_error(&e),
        },
        Some(FormAction::Update) => {
            match router
                .update_contact(&form.token(), &form.contact_form())
                .await
            {
                Ok(updated) => ActionResult::updated(updated),
                Err(e) => ActionResult::from_error(&e),
            }
        }
        Some(FormAction::Delete) => match router.delete_contact(&form.token()).await {
            Ok(deleted) => ActionResult::deleted(deleted),
            Err(e) => ActionResult::from_error(&e),
        },
        Some(FormAction::Upload) => match form.import_rows() {
            Ok(rows) => ActionResult::imported(router.import_contacts(&rows).await),
            Err(e) => ActionResult::failed("Upload", e.to_string()),
        },
        Some(FormAction::RefreshPage) => ActionResult::page_refreshed(),
        None => {
            tracing::warn!(action = ?form.action, "unhandled form action");
            ActionResult::unhandled()
        }
    };

    if result.error {
        tracing::warn!(
            name = result.name.as_deref().unwrap_or_default(),
            message = result.error_message.as_deref().unwrap_or_default(),
            "contact action failed"
        );
    }

    Json(result.with_notice())
}
