//! HTTP request handlers

use addressbook_api::paths;
use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod contacts;
pub mod health;

use crate::{middleware::require_session, state::AppState};

/// Build all API routes
pub fn routes(state: AppState) -> Router<AppState> {
    let contacts = Router::new()
        .route(
            paths::CONTACTS,
            get(contacts::load_contacts).post(contacts::contact_action),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, require_session));

    Router::new()
        // Health check
        .route(paths::HEALTH, get(health::health_check))
        // Session endpoints
        .route(paths::LOGIN, post(auth::login))
        .route(paths::LOGOUT, post(auth::logout))
        .route(paths::SESSION, get(auth::session))
        .merge(contacts)
}
