//! Authentication utilities

use addressbook_api::SessionClaims;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::error::ServerResult;

/// Hash a plaintext password
pub fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> ServerResult<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a session token for `username`
pub fn generate_session_token(
    username: &str,
    encoding_key: &EncodingKey,
    ttl_seconds: u64,
) -> ServerResult<String> {
    let now = chrono::Utc::now().timestamp();

    let claims = SessionClaims {
        sub: username.to_string(),
        iat: now,
        exp: now.saturating_add(i64::try_from(ttl_seconds).unwrap_or(i64::MAX)),
        jti: uuid::Uuid::new_v4(),
    };

    Ok(encode(&Header::default(), &claims, encoding_key)?)
}

/// Validate a session token
pub fn validate_session_token(
    token: &str,
    decoding_key: &DecodingKey,
) -> ServerResult<SessionClaims> {
    let token_data = decode::<SessionClaims>(token, decoding_key, &Validation::default())?;
    Ok(token_data.claims)
}
