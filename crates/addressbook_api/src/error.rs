//! API error types

use addressbook_core::CoreError;
use miette::{Diagnostic, JSONReportHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, thiserror::Error, Diagnostic, Serialize, Deserialize)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation failed: {message}")]
    #[diagnostic(
        code(api::validation_error),
        help("Check the field errors for specific validation issues")
    )]
    ValidationError {
        message: String,
        fields: Option<Vec<FieldError>>,
    },

    /// Authentication required
    #[error("Authentication required")]
    #[diagnostic(
        code(api::unauthorized),
        help("Log in to obtain a session token")
    )]
    Unauthorized { message: Option<String> },

    /// Core error from addressbook-core
    #[error("{message}")]
    #[diagnostic(code(api::core_error), help("Contact store operation failed"))]
    Core { message: String, json: String },

    /// JSON error
    #[error("{message}")]
    #[diagnostic(
        code(api::json_error),
        help("Check that your JSON is valid and matches the expected schema")
    )]
    Json { message: String, json: String },

    /// Service temporarily unavailable
    #[error("Service temporarily unavailable")]
    #[diagnostic(
        code(api::service_unavailable),
        help("The service is temporarily down for maintenance")
    )]
    ServiceUnavailable { retry_after_seconds: Option<u64> },
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::ServiceUnavailable { .. } => 503,

            ApiError::Core { .. } => 500,

            ApiError::Json { .. } => 400,
        }
    }

    /// Create a validation error with field details
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            fields: None,
        }
    }

    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::ValidationError {
            message: message.into(),
            fields: Some(fields),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: Some(message.into()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if let CoreError::MissingToken { operation } = &err {
            return Self::validation_with_fields(
                err.to_string(),
                vec![FieldError {
                    field: "token".to_string(),
                    message: format!("{} needs a contact token", operation),
                }],
            );
        }

        let handler = JSONReportHandler::new();

        let message = format!("{}", err);
        let mut json = String::new();

        let err: Box<dyn Diagnostic> = Box::new(err);
        handler
            .render_report(&mut json, err.as_ref())
            .unwrap_or_default();

        Self::Core { message, json }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        let diagnostic = miette::miette!(
            code = "json::parse_error",
            help = "Check that your JSON is valid",
            "{}",
            err
        );

        let handler = JSONReportHandler::new();
        let message = err.to_string();
        let mut json = String::new();

        handler
            .render_report(&mut json, diagnostic.as_ref())
            .unwrap_or_default();

        Self::Json { message, json }
    }
}

// Server-side response conversion
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_message = self.to_string();
        let error_type = match &self {
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Core { .. } => "core_error",
            ApiError::Json { .. } => "json_error",
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
        };

        let detail = match &self {
            ApiError::Core { json, .. } => Some(json.clone()),
            ApiError::Json { json, .. } => Some(json.clone()),
            ApiError::Unauthorized { message } => message.clone(),
            _ => None,
        };

        let mut error_obj = serde_json::json!({
            "type": error_type,
            "message": error_message,
        });

        if let ApiError::ValidationError {
            fields: Some(fields),
            ..
        } = &self
        {
            error_obj["fields"] = serde_json::to_value(fields).unwrap_or_default();
        }

        if let Some(d) = detail {
            error_obj["detail"] = serde_json::Value::String(d);
        }

        let body = serde_json::json!({
            "error": error_obj,
            "timestamp": chrono::Utc::now(),
        });

        (status, Json(body)).into_response()
    }
}
