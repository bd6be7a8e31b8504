//! API request types

use addressbook_core::{ContactForm, ContactToken, listing::SortDirection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};

/// Operator login
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Query string of the contacts loader
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContactsQuery {
    /// Look up a single contact instead of listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
}

impl ContactsQuery {
    /// The email to search for, if one was given
    pub fn search_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// The `_action` values the contacts form submits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FormAction {
    Create,
    Update,
    Delete,
    Upload,
    RefreshPage,
}

impl FormAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "upload" => Some(Self::Upload),
            "refreshPage" => Some(Self::RefreshPage),
            _ => None,
        }
    }
}

/// Urlencoded body of `POST /contacts`.
///
/// Every field is optional on the wire; absent fields become empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactActionForm {
    #[serde(rename = "_action", default)]
    pub action: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    /// JSON array of contacts for `upload`
    #[serde(default)]
    pub payload: Option<String>,
}

impl ContactActionForm {
    /// The submitted action, `None` when missing or unknown
    pub fn action(&self) -> Option<FormAction> {
        self.action.as_deref().and_then(FormAction::parse)
    }

    pub fn token(&self) -> ContactToken {
        ContactToken::new(self.token.as_deref().unwrap_or_default().trim())
    }

    pub fn contact_form(&self) -> ContactForm {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        ContactForm {
            name: field(&self.name),
            email: field(&self.email),
            phone: field(&self.phone),
            state: field(&self.state),
            country: field(&self.country),
            zipcode: field(&self.zipcode),
            job_title: field(&self.job_title),
        }
    }

    /// Contacts carried by an `upload` submission
    pub fn import_rows(&self) -> Result<Vec<ContactForm>, ApiError> {
        let payload = self.payload.as_deref().unwrap_or_default();
        if payload.trim().is_empty() {
            return Err(ApiError::validation_with_fields(
                "Nothing to upload",
                vec![FieldError {
                    field: "payload".to_string(),
                    message: "expected a JSON array of contacts".to_string(),
                }],
            ));
        }
        Ok(serde_json::from_str(payload)?)
    }
}
