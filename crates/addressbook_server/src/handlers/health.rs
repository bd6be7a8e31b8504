//! Health check endpoint

use addressbook_api::responses::{HealthResponse, HealthStatus};
use axum::{Json, extract::State};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: addressbook_api::API_VERSION.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
