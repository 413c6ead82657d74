//! # JWT Token Management
//!
//! JWT creation and validation for access and refresh tokens.
//!
//! Access and refresh tokens share the same claim shape but are signed
//! with distinct secrets, so leaking one secret does not compromise the
//! other class of tokens.

use chrono::{DateTime, Duration, Utc};
use cuid2::CuidConstructor;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while creating or validating tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(String),

    #[error("Token validation failed: {0}")]
    Invalid(String),
}

/// JWT configuration for both token classes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens.
    pub access_secret: String,

    /// Secret for signing refresh tokens. Must differ from
    /// `access_secret`.
    pub refresh_secret: String,

    /// Access token lifetime in minutes.
    pub access_token_minutes: i64,

    /// Refresh token lifetime in days.
    pub refresh_token_days: i64,
}

impl JwtConfig {
    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a message if either secret is empty or the two secrets are
    /// equal.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err("JWT secrets must not be empty".to_string());
        }
        if self.access_secret == self.refresh_secret {
            return Err("Access and refresh secrets must differ".to_string());
        }
        if self.access_token_minutes <= 0 || self.refresh_token_days <= 0 {
            return Err("Token lifetimes must be positive".to_string());
        }
        Ok(())
    }
}

/// JWT claims structure, shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User email
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token ID
    pub jti: String,
}

fn encode(secret: &str, sub: &str, email: &str, lifetime: Duration) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        jti: CuidConstructor::new().with_length(24).create_id(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

fn decode(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| TokenError::Invalid(e.to_string()))?;

    Ok(claims.claims)
}

/// Creates a short-lived access token for a user.
///
/// # Errors
///
/// Returns an error if token encoding fails.
pub fn create_access_token(config: &JwtConfig, user_id: &str, email: &str) -> Result<String, TokenError> {
    encode(
        &config.access_secret,
        user_id,
        email,
        Duration::minutes(config.access_token_minutes),
    )
}

/// Creates a long-lived refresh token for a user, returning the token and
/// its expiry timestamp.
///
/// # Errors
///
/// Returns an error if token encoding fails.
pub fn create_refresh_token(
    config: &JwtConfig,
    user_id: &str,
    email: &str,
) -> Result<(String, DateTime<Utc>), TokenError> {
    let expires_at = Utc::now() + Duration::days(config.refresh_token_days);
    let token = encode(
        &config.refresh_secret,
        user_id,
        email,
        Duration::days(config.refresh_token_days),
    )?;
    Ok((token, expires_at))
}

/// Validates an access token and returns its claims.
///
/// # Errors
///
/// Returns an error if the signature is invalid or the token has expired.
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    decode(&config.access_secret, token)
}

/// Validates a refresh token's signature and expiry against the refresh
/// secret.
///
/// # Errors
///
/// Returns an error if the signature is invalid or the token has expired.
pub fn validate_refresh_token(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    decode(&config.refresh_secret, token)
}

/// Extracts the Bearer token from an Authorization header value.
///
/// Returns the token string if present, or None if missing/invalid.
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    if !auth_header.starts_with("Bearer ") {
        return None;
    }

    let token = auth_header.trim_start_matches("Bearer ").trim();

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}
