//! Address Book API types and definitions
//!
//! This crate defines the request/response types for the address book HTTP
//! API, shared between the server and its clients.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::ApiError;

// Re-export common types from addressbook-core
pub use addressbook_core::ContactToken;
pub use addressbook_core::contact::{Contact, ContactForm};
pub use addressbook_core::listing::SortDirection;

/// API version constant
pub const API_VERSION: &str = "v1";

/// Route paths, relative to `/api/{API_VERSION}`
pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const SESSION: &str = "/auth/session";
    pub const CONTACTS: &str = "/contacts";
}

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "addressbook_session";

/// Claims of a session token
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionClaims {
    /// Operator username
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    pub jti: uuid::Uuid,
}

/// Pagination parameters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    10
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items in this page
    pub items: Vec<T>,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub limit: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl<T> From<addressbook_core::listing::Page<T>> for PaginatedResponse<T> {
    fn from(page: addressbook_core::listing::Page<T>) -> Self {
        Self {
            items: page.items,
            page: page.page,
            limit: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}
