//! Contact records and the store rows they are assembled from

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::token::ContactToken;

/// Fields submitted when creating or editing a contact.
///
/// Every field is a plain string; anything the client leaves out is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
    pub job_title: String,
}

impl ContactForm {
    /// The personal fields routed to whichever store owns the contact
    pub fn personal(&self) -> PersonalFields<'_> {
        PersonalFields {
            name: &self.name,
            email: &self.email,
            phone: &self.phone,
        }
    }

    /// Location row for this form, keyed by `token`
    pub fn location_row(&self, token: &ContactToken) -> LocationRow {
        LocationRow {
            token: token.clone(),
            state: Some(self.state.clone()),
            country: Some(self.country.clone()),
            zipcode: Some(self.zipcode.clone()),
            job_title: Some(self.job_title.clone()),
        }
    }

    /// User row for this form, keyed by `token`
    pub fn user_row(&self, token: &ContactToken) -> UserRow {
        UserRow {
            token: token.clone(),
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone()),
        }
    }
}

/// Borrowed view of the personally identifying fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

/// Lenient decoding for columns read back from a store.
///
/// Stores return untyped JSON, so a phone or zipcode may arrive as a number.
/// Scalars become strings; arrays, objects and null become absent.
pub(crate) mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    use crate::token::ContactToken;

    fn scalar(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?))
    }

    pub fn token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ContactToken, D::Error> {
        scalar(Value::deserialize(deserializer)?)
            .map(ContactToken::new)
            .ok_or_else(|| D::Error::custom("token must be a string or a number"))
    }
}

/// A row of the general store's user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    #[serde(deserialize_with = "lenient::token")]
    pub token: ContactToken,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A row of the general store's location table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRow {
    #[serde(deserialize_with = "lenient::token")]
    pub token: ContactToken,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient::field", skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(
        default,
        rename = "jobTitle",
        alias = "job_title",
        deserialize_with = "lenient::field",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_title: Option<String>,
}

/// A contact as assembled from one or both stores.
///
/// Fields no store supplied stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub token: ContactToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl Contact {
    pub fn new(token: ContactToken) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    /// Overlay the fields of a user row
    pub fn with_user(mut self, user: UserRow) -> Self {
        self.name = user.name.or(self.name);
        self.email = user.email.or(self.email);
        self.phone = user.phone.or(self.phone);
        self
    }

    /// Overlay the fields of a location row
    pub fn with_location(mut self, location: LocationRow) -> Self {
        self.state = location.state.or(self.state);
        self.country = location.country.or(self.country);
        self.zipcode = location.zipcode.or(self.zipcode);
        self.job_title = location.job_title.or(self.job_title);
        self
    }

    /// Whether the listing should show this contact at all
    pub fn is_displayable(&self) -> bool {
        fn present(field: &Option<String>) -> bool {
            field.as_deref().is_some_and(|value| !value.trim().is_empty())
        }
        present(&self.name) && present(&self.country)
    }
}

impl From<UserRow> for Contact {
    fn from(user: UserRow) -> Self {
        let token = user.token.clone();
        Contact::new(token).with_user(user)
    }
}
