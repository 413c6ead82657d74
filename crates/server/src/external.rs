//! # External Identity Provider
//!
//! Exchanges a provider-issued bearer token for a verified identity via
//! the provider's userinfo endpoint. All failures on this path collapse
//! into [`AppError::ExternalAuth`]; the caller never learns whether the
//! token was malformed, expired, or revoked.

use async_trait::async_trait;
use error::{AppError, Result};
use serde::Deserialize;

const EXCHANGE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Identity claims returned by the provider.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    /// Provider-scoped subject id.
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

/// Exchanges provider tokens for identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies the token with the provider and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ExternalAuth`] if the provider rejects the
    /// token or returns an unusable response.
    async fn exchange(&self, token: &str) -> Result<ExternalIdentity>;
}

/// Userinfo response shape (OpenID Connect).
#[derive(Debug, Deserialize)]
struct UserInfoBody {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

/// Identity provider backed by an OpenID Connect userinfo endpoint.
pub struct HttpIdentityProvider {
    client:   reqwest::Client,
    endpoint: String,
}

impl HttpIdentityProvider {
    /// Builds the client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build identity client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange(&self, token: &str) -> Result<ExternalIdentity> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::external_auth(format!("Identity provider unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::external_auth("Identity provider rejected token"));
        }

        let body: UserInfoBody = response
            .json()
            .await
            .map_err(|_| AppError::external_auth("Identity provider returned malformed claims"))?;

        Ok(ExternalIdentity {
            id: body.sub,
            email: body.email,
            name: body.name,
            email_verified: body.email_verified,
        })
    }
}
