use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Issue a bearer token for `subject`, expiring after the configured TTL.
pub fn issue(subject: &str) -> Result<String, TokenError> {
    let ttl = Duration::minutes(config::config().security.jwt_expiry_minutes);
    issue_with_ttl(subject, ttl)
}

pub fn issue_with_ttl(subject: &str, ttl: Duration) -> Result<String, TokenError> {
    sign(config::config().security.jwt_secret.as_bytes(), &Claims::new(subject, ttl))
}

/// Validate a bearer token and return its subject.
///
/// The signature is checked before anything else; structural and signature
/// failures are collapsed into a single `Invalid` so callers cannot probe
/// which part failed. Expiry is checked with zero leeway, so a token whose
/// TTL was zero is already expired on the next call.
pub fn validate(token: &str) -> Result<String, TokenError> {
    verify(config::config().security.jwt_secret.as_bytes(), token)
}

fn sign(secret: &[u8], claims: &Claims) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Signing("JWT secret not configured".to_string()));
    }
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
        .map_err(|e| TokenError::Signing(e.to_string()))
}

fn verify(secret: &[u8], token: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Invalid);
    }

    // Expiry is enforced manually below so that `now >= exp` counts as
    // expired; the library's default check lets a token live through the
    // second it expires in, plus 60s of leeway.
    let mut validation = Validation::default();
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|_| TokenError::Invalid)?;

    if Utc::now().timestamp() >= data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(data.claims.sub)
}
