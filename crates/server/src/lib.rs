//! # Clipsync API Server
//!
//! Axum-based HTTP and websocket server for clipboard synchronization.
//!
//! ## Modules
//!
//! - [`auth`]: Session lifecycle (sign-up/sign-in, OTP, token rotation)
//! - [`config`]: Environment-driven application configuration
//! - [`dto`]: Request/response data transfer objects
//! - [`external`]: External identity provider client
//! - [`gateway`]: Realtime websocket gateway
//! - [`mail`]: Outbound transactional mail dispatch
//! - [`middleware`]: HTTP middleware (auth)
//! - [`presence`]: Per-user device presence registry
//! - [`router`]: API route configuration

use std::sync::Arc;

use ::auth::JwtConfig;

pub mod auth;
pub mod config;
pub mod dto;
pub mod external;
pub mod gateway;
pub mod mail;
pub mod middleware;
pub mod presence;
pub mod router;

pub use router::create_app_router;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db:         sea_orm::DbConn,
    /// JWT configuration
    pub jwt_config: JwtConfig,
    /// Outbound mail collaborator
    pub mailer:     Arc<dyn mail::Mailer>,
    /// External identity provider client
    pub identity:   Arc<dyn external::IdentityProvider>,
    /// Presence registry (per-user connection sets)
    pub presence:   Arc<presence::PresenceRegistry>,
    /// Live websocket client map
    pub gateway:    Arc<gateway::GatewayState>,
    /// One-time code lifetime in minutes
    pub otp_ttl_minutes: i64,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Assembles application state around an open database connection.
    #[must_use]
    pub fn new(
        db: sea_orm::DbConn,
        jwt_config: JwtConfig,
        mailer: Arc<dyn mail::Mailer>,
        identity: Arc<dyn external::IdentityProvider>,
    ) -> Self {
        Self {
            presence: Arc::new(presence::PresenceRegistry::new(db.clone())),
            gateway: Arc::new(gateway::GatewayState::new()),
            db,
            jwt_config,
            mailer,
            identity,
            otp_ttl_minutes: config::DEFAULT_OTP_TTL_MINUTES,
            start_time: std::time::Instant::now(),
        }
    }

    /// Overrides the one-time code lifetime.
    #[must_use]
    pub fn with_otp_ttl(mut self, minutes: i64) -> Self {
        self.otp_ttl_minutes = minutes;
        self
    }
}
