//! # Common Test Utilities
//!
//! Shared test infrastructure: in-memory database setup, application
//! state builders and fixtures for integration tests.

use std::sync::{Arc, Once};

use async_trait::async_trait;
use auth::JwtConfig;
use error::{AppError, Result};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DbConn};
use server::{
    external::{ExternalIdentity, IdentityProvider},
    mail::NoopMailer,
    AppState,
};

/// Initialize test logging (run once per test session)
static INIT: Once = Once::new();

/// Initialize test environment including structured logging
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Fresh in-memory database with migrations applied.
///
/// The pool is pinned to a single connection; an in-memory sqlite
/// database exists per connection, so a larger pool would hand out
/// empty databases.
pub async fn test_db() -> DbConn {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// JWT configuration with distinct test secrets.
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret-at-least-32-byte!".to_string(),
        refresh_secret: "test-refresh-secret-at-least-32-byt!".to_string(),
        access_token_minutes: 15,
        refresh_token_days: 30,
    }
}

/// Identity provider stub returning a fixed identity, or rejecting
/// every token when unconfigured.
#[derive(Debug, Default)]
pub struct StubIdentityProvider {
    pub identity: Option<ExternalIdentity>,
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn exchange(&self, _token: &str) -> Result<ExternalIdentity> {
        self.identity
            .clone()
            .ok_or_else(|| AppError::external_auth("Identity provider rejected token"))
    }
}

/// Application state over a fresh in-memory database.
pub async fn test_state() -> AppState {
    init_test_env();
    AppState::new(
        test_db().await,
        test_jwt_config(),
        Arc::new(NoopMailer),
        Arc::new(StubIdentityProvider::default()),
    )
}

/// Application state whose identity provider accepts every token as
/// the given identity.
pub async fn test_state_with_identity(identity: ExternalIdentity) -> AppState {
    init_test_env();
    AppState::new(
        test_db().await,
        test_jwt_config(),
        Arc::new(NoopMailer),
        Arc::new(StubIdentityProvider {
            identity: Some(identity),
        }),
    )
}

/// Test fixture for user data
pub struct UserFixture {
    pub name:     Option<String>,
    pub email:    String,
    pub password: String,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            name:     Some("Test User".to_string()),
            email:    "test@example.com".to_string(),
            password: "TestPassword123!".to_string(),
        }
    }
}

impl UserFixture {
    /// Create a new user fixture with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }
}
