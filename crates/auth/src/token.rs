//! Token issuance and verification.
//!
//! Tokens are HS256-signed JWTs keyed by the issuing application's secret.
//! The server never stores issued tokens; any holder of the application
//! secret can verify one by re-deriving the signature.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sigil_core::{Application, User};

/// Claims asserted by an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: i64,
    pub email: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch (`iat` + configured TTL).
    pub exp: i64,
    pub role: String,
    /// Permission scope, space-joined (e.g. `"tasks:read tasks:write"`).
    pub scope: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// The signing primitive itself failed. Fatal, never retried.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token verification failed: {0}")]
    Verification(#[source] jsonwebtoken::errors::Error),
}

/// Issue a signed token for `user` against `application`.
///
/// Deterministic given identical inputs and timestamp; the only side effect
/// is reading the current time.
pub fn issue(
    user: &User,
    application: &Application,
    ttl: Duration,
    role: &str,
    scope: &[String],
) -> Result<String, TokenError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        role: role.to_string(),
        scope: scope.join(" "),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(application.secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

/// Decode and verify a token with the issuing application's secret.
pub fn decode(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(TokenError::Verification)?;

    Ok(data.claims)
}
