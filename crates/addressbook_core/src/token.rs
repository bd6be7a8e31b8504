//! Contact tokens
//!
//! A token is the join key between a contact's records in the PII store and
//! the general store. Tokens minted here for general-store contacts carry
//! [`GLOBAL_TOKEN_PREFIX`]; tokens issued by the PII store are opaque.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Prefix marking a token minted for the general store
pub const GLOBAL_TOKEN_PREFIX: &str = "gbl_";

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ContactToken(String);

impl ContactToken {
    /// Mint a fresh general-store token
    pub fn mint_global() -> Self {
        Self(format!("{}{}", GLOBAL_TOKEN_PREFIX, Uuid::new_v4()))
    }

    /// Wrap a token received from a store or a client
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Whether this token was minted for the general store
    pub fn is_global(&self) -> bool {
        self.0.starts_with(GLOBAL_TOKEN_PREFIX)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ContactToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContactToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for ContactToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl AsRef<str> for ContactToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_tokens_are_global_and_unique() {
        let a = ContactToken::mint_global();
        let b = ContactToken::mint_global();
        assert!(a.is_global());
        assert!(a.as_str().starts_with(GLOBAL_TOKEN_PREFIX));
        assert_ne!(a, b);

        let uuid_part = &a.as_str()[GLOBAL_TOKEN_PREFIX.len()..];
        assert!(Uuid::parse_str(uuid_part).is_ok());
    }

    #[test]
    fn test_opaque_tokens_are_not_global() {
        assert!(!ContactToken::new("7f3c9a0e21").is_global());
        assert!(!ContactToken::new("").is_global());
        assert!(!ContactToken::new("gbl").is_global());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let token = ContactToken::new("abc");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc\"");
    }
}
