//! Bearer-token authentication for tracker routes.
//!
//! Tokens are issued by the stakeholders service as HS256 JWTs carrying
//! `uid`, `username`, and `roles` claims. This module only verifies them.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::TrackerError;

/// JWT claims shared across the platform's services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user ID.
    pub uid: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: u64,
}

/// Identity of the caller, resolved from the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user ID; becomes the execution's `touristId`.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Granted roles.
    pub roles: Vec<String>,
}

/// Verifies HS256 bearer tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Validates signature and expiry and returns the caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Unauthorized`] for bad signatures, expired
    /// tokens, malformed claims, or an empty `uid`.
    pub fn verify(&self, token: &str) -> Result<AuthContext, TrackerError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| TrackerError::Unauthorized(format!("invalid token: {e}")))?;
        let claims = data.claims;
        if claims.uid.trim().is_empty() {
            return Err(TrackerError::Unauthorized("token has no uid".to_string()));
        }
        Ok(AuthContext {
            user_id: claims.uid,
            username: claims.username,
            roles: claims.roles,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(parts: &Parts) -> Result<&str, TrackerError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| TrackerError::Unauthorized("missing bearer token".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| TrackerError::Unauthorized("malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| TrackerError::Unauthorized("missing bearer token".to_string()))
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = TrackerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let auth = state.token_verifier.verify(token)?;
        tracing::debug!(user_id = %auth.user_id, "caller authenticated");
        Ok(auth)
    }
}
