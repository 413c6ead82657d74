//! # Application Configuration
//!
//! Environment-driven configuration for the clipsync server. All variables
//! use the `CLIPSYNC_` prefix; see the field docs for names and defaults.

use ::auth::JwtConfig;
use error::{AppError, Result};

/// Default OTP lifetime in minutes.
pub const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Transactional mail endpoint configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `CLIPSYNC_MAIL_API_URL` - transactional email API endpoint
    pub api_url: String,

    /// `CLIPSYNC_MAIL_API_KEY` - API key for the mail provider
    pub api_key: String,

    /// `CLIPSYNC_MAIL_SENDER` - sender address for outbound mail
    pub sender: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `CLIPSYNC_HOST` - bind address (default `0.0.0.0`)
    pub host: String,

    /// `CLIPSYNC_PORT` - bind port (default `8080`)
    pub port: u16,

    /// `CLIPSYNC_DATABASE_URL` - SeaORM connection string (required)
    pub database_url: String,

    /// JWT secrets and lifetimes
    pub jwt: JwtConfig,

    /// `CLIPSYNC_OTP_TTL_MINUTES` - one-time code lifetime (default 10)
    pub otp_ttl_minutes: i64,

    /// Mail dispatch settings; absent means mail is a logged no-op
    pub mail: Option<MailConfig>,

    /// `CLIPSYNC_IDENTITY_ENDPOINT` - external provider userinfo URL
    pub identity_endpoint: String,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when a required variable is missing,
    /// a numeric variable fails to parse, or the JWT configuration is
    /// invalid.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: env_or("CLIPSYNC_HOST", "0.0.0.0"),
            port: parse_env("CLIPSYNC_PORT", 8080)?,
            database_url: require_env("CLIPSYNC_DATABASE_URL")?,
            jwt: JwtConfig {
                access_secret: require_env("CLIPSYNC_ACCESS_SECRET")?,
                refresh_secret: require_env("CLIPSYNC_REFRESH_SECRET")?,
                access_token_minutes: parse_env("CLIPSYNC_ACCESS_TOKEN_MINUTES", 15)?,
                refresh_token_days: parse_env("CLIPSYNC_REFRESH_TOKEN_DAYS", 30)?,
            },
            otp_ttl_minutes: parse_env("CLIPSYNC_OTP_TTL_MINUTES", DEFAULT_OTP_TTL_MINUTES)?,
            mail: mail_from_env()?,
            identity_endpoint: env_or(
                "CLIPSYNC_IDENTITY_ENDPOINT",
                "https://www.googleapis.com/oauth2/v3/userinfo",
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the JWT settings are unusable or the
    /// database URL is empty.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(AppError::config("CLIPSYNC_DATABASE_URL must not be empty"));
        }
        self.jwt.validate().map_err(AppError::config)?;
        if self.otp_ttl_minutes <= 0 {
            return Err(AppError::config("CLIPSYNC_OTP_TTL_MINUTES must be positive"));
        }
        Ok(())
    }

    /// Socket address string for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| AppError::config(format!("{key} is required")))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("{key} is not a valid number"))),
        Err(_) => Ok(default),
    }
}

/// Mail configuration is all-or-nothing: either every variable is set or
/// mail dispatch falls back to a logged no-op.
fn mail_from_env() -> Result<Option<MailConfig>> {
    let api_url = std::env::var("CLIPSYNC_MAIL_API_URL").ok();
    let api_key = std::env::var("CLIPSYNC_MAIL_API_KEY").ok();
    let sender = std::env::var("CLIPSYNC_MAIL_SENDER").ok();

    match (api_url, api_key, sender) {
        (Some(api_url), Some(api_key), Some(sender)) => Ok(Some(MailConfig {
            api_url,
            api_key,
            sender,
        })),
        (None, None, None) => Ok(None),
        _ => Err(AppError::config(
            "CLIPSYNC_MAIL_API_URL, CLIPSYNC_MAIL_API_KEY and CLIPSYNC_MAIL_SENDER must be set together",
        )),
    }
}
