//! # Mail Dispatch
//!
//! Outbound transactional mail behind the [`Mailer`] trait. The HTTP
//! implementation posts to a Brevo-style endpoint; callers treat every
//! send as best-effort and log failures instead of surfacing them.

use async_trait::async_trait;
use error::{AppError, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::MailConfig;

const MAIL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A mail recipient.
#[derive(Debug, Clone, Serialize)]
pub struct MailAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name:  Option<String>,
    pub email: String,
}

impl MailAddress {
    #[must_use]
    pub fn new(name: Option<String>, email: &str) -> Self {
        Self {
            name,
            email: email.to_string(),
        }
    }
}

/// Outbound mail collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a message to the recipients. The body is already composed;
    /// no templating happens here.
    async fn send(&self, recipients: &[MailAddress], subject: &str, body: &str) -> Result<()>;
}

/// Mailer backed by a transactional email HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    /// Builds the mailer with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the HTTP client cannot be built.
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(MAIL_TIMEOUT)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build mail client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, recipients: &[MailAddress], subject: &str, body: &str) -> Result<()> {
        let payload = json!({
            "sender": { "email": self.config.sender },
            "to": recipients,
            "subject": subject,
            "htmlContent": body,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Mail request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "Mail provider returned {}",
                response.status()
            )));
        }

        info!(recipients = recipients.len(), subject = %subject, "Mail dispatched");
        Ok(())
    }
}

/// Mailer that drops every message with a log line. Backs tests and
/// deployments without mail configuration.
#[derive(Debug, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, recipients: &[MailAddress], subject: &str, _body: &str) -> Result<()> {
        warn!(
            recipients = recipients.len(),
            subject = %subject,
            "Mail dispatch skipped (no mail configuration)"
        );
        Ok(())
    }
}
