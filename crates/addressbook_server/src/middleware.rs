//! Session middleware

use addressbook_api::{ApiError, SESSION_COOKIE, SessionClaims};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::state::AppState;

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Session token from the Authorization header, else from the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers)
        .map(str::to_string)
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string())
        })
        .filter(|token| !token.is_empty())
}

/// Claims of a valid, unexpired session, if the request carries one
pub fn session_claims(state: &AppState, headers: &HeaderMap) -> Option<SessionClaims> {
    let token = session_token(headers)?;
    crate::auth::validate_session_token(&token, &state.jwt_decoding_key)
        .map_err(|e| tracing::debug!("rejected session token: {}", e))
        .ok()
}

pub fn is_logged_in(state: &AppState, headers: &HeaderMap) -> bool {
    session_claims(state, headers).is_some()
}

/// Reject requests without a valid session before they reach a handler
pub async fn require_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = session_claims(&state, &headers)
        .ok_or_else(|| ApiError::unauthorized("Missing or expired session"))?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
