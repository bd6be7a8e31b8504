//! Session handlers

use addressbook_api::{
    ApiError, SESSION_COOKIE,
    requests::LoginRequest,
    responses::{LoginResponse, SessionResponse},
};
use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    auth::{generate_session_token, verify_password},
    error::{ServerError, ServerResult},
    middleware::is_logged_in,
    state::AppState,
};

fn invalid_credentials() -> ServerError {
    ApiError::unauthorized("Invalid username or password").into()
}

/// Handle login requests
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ServerResult<(CookieJar, Json<LoginResponse>)> {
    let operator = &state.config.operator;

    if operator.password_hash.is_empty() {
        tracing::warn!("login attempted but no operator password is configured");
        return Err(invalid_credentials());
    }
    if request.username != operator.username {
        return Err(invalid_credentials());
    }

    let verified = verify_password(&request.password, &operator.password_hash).inspect_err(|e| {
        tracing::error!(error = %e, "configured operator password hash is unusable");
    })?;
    if !verified {
        return Err(invalid_credentials());
    }

    let token = generate_session_token(
        &operator.username,
        &state.jwt_encoding_key,
        state.config.session_ttl,
    )?;

    tracing::info!(username = %operator.username, "operator logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.session_ttl,
            username: operator.username.clone(),
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Whether the caller is logged in, and where this deployment runs
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let data_center = state.config.data_center.as_ref();

    Json(SessionResponse {
        logged_in: is_logged_in(&state, &headers),
        data_center: data_center.map(|dc| dc.label()),
        is_private_region: data_center.is_some_and(|dc| dc.is_eu()),
    })
}
