//! API response types

use addressbook_core::router::{Created, Deleted, ImportReport, Updated};
use addressbook_core::{Contact, ContactToken, CoreError, listing::SortDirection};
use serde::{Deserialize, Serialize};

use crate::PaginatedResponse;

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Session token, also set as a cookie
    pub token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expiration time in seconds
    pub expires_in: u64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub logged_in: bool,
    /// Label of the data center serving this request, e.g. `Frankfurt, DE`
    pub data_center: Option<String>,
    /// Whether that data center is in the restricted region
    pub is_private_region: bool,
}

/// Loader response for `GET /contacts`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsPage {
    #[serde(flatten)]
    pub contacts: PaginatedResponse<Contact>,
    /// Direction the list is sorted in, if any
    pub sort: Option<SortDirection>,
    /// Direction to request when the name header is clicked
    pub next_sort: SortDirection,
}

/// Outcome of a `POST /contacts` action.
///
/// Store failures come back here with `error` set rather than as HTTP errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub error: bool,
    pub is_private: bool,
    pub is_added: bool,
    pub is_updated: bool,
    pub is_deleted: bool,
    pub is_page_refresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<ContactToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported: Option<ImportReport>,
    /// Toast for the page, filled in by [`ActionResult::with_notice`]
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl ActionResult {
    pub fn added(created: Created) -> Self {
        Self {
            is_private: created.is_private,
            is_added: true,
            token: Some(created.token),
            ..Default::default()
        }
    }

    pub fn updated(updated: Updated) -> Self {
        Self {
            is_private: updated.is_private,
            is_updated: true,
            token: Some(updated.token),
            ..Default::default()
        }
    }

    pub fn deleted(deleted: Deleted) -> Self {
        Self {
            is_private: deleted.is_private,
            is_deleted: true,
            token: Some(deleted.token),
            ..Default::default()
        }
    }

    pub fn page_refreshed() -> Self {
        Self {
            is_page_refresh: true,
            ..Default::default()
        }
    }

    /// An upload counts as added when at least one row was created
    pub fn imported(report: ImportReport) -> Self {
        if report.created.is_empty() && !report.failures.is_empty() {
            let message = report
                .failures
                .first()
                .map(|failure| failure.message.clone())
                .unwrap_or_default();
            return Self {
                imported: Some(report),
                ..Self::failed("Upload", message)
            };
        }

        Self {
            is_private: report.created.iter().any(|created| created.is_private),
            is_added: true,
            imported: Some(report),
            ..Default::default()
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: true,
            name: Some(name.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn unhandled() -> Self {
        Self::failed("Form action", "Unhandled form action")
    }

    /// Flag a router failure, naming the store it came from
    pub fn from_error(error: &CoreError) -> Self {
        match error {
            CoreError::StoreWriteFailed { store, message, .. }
            | CoreError::StoreReadFailed { store, message, .. } => {
                Self::failed(store.clone(), message.clone())
            }
            other => Self::failed("Contact", other.to_string()),
        }
    }

    pub fn with_notice(mut self) -> Self {
        self.notice = self.toast();
        self
    }

    /// The toast the page shows for this result, if any
    pub fn toast(&self) -> Option<Notice> {
        if self.error {
            return Some(Notice {
                kind: ToastKind::Error,
                message: format!(
                    "{}: {}",
                    self.name.as_deref().unwrap_or_default(),
                    self.error_message.as_deref().unwrap_or_default()
                ),
            });
        }

        let message = if self.is_added {
            "Your new record will reflect shortly"
        } else if self.is_updated {
            "Your record is updated and will reflect shortly"
        } else if self.is_deleted {
            "Your record is deleted and will reflect shortly"
        } else if self.is_page_refresh {
            "Page refreshed successfully"
        } else {
            return None;
        };

        Some(Notice {
            kind: if self.is_private {
                ToastKind::Info
            } else {
                ToastKind::Success
            },
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: ToastKind,
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}
