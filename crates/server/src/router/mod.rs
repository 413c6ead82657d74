//! # API Router Configuration
//!
//! Configures API routes for the clipsync application.

use axum::{
    extract::{Extension, State as AxumState},
    middleware,
    routing::{get, post},
    Json,
    Router,
};
use error::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// Creates the API router with all routes
///
/// # Arguments
///
/// * `state` - Application state containing DB pool and config
///
/// # Returns
///
/// Configured Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .route("/api/v1/user/last-message", get(last_message_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // Public routes that don't require authentication
    let public_routes = Router::new()
        .route("/api/v1/auth/sign-up", post(sign_up_handler))
        .route("/api/v1/auth/sign-in", post(sign_in_handler))
        .route(
            "/api/v1/auth/sign-in-passwordless",
            post(passwordless_handler),
        )
        .route("/api/v1/auth/verify-email", post(verify_email_handler))
        .route("/api/v1/auth/resend-email-otp", post(resend_otp_handler))
        .route("/api/v1/auth/external-auth", post(external_auth_handler))
        .route("/api/v1/auth/refresh-tokens", post(refresh_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/ws", get(crate::gateway::ws::ws_upgrade_handler));

    public_routes.merge(protected_routes).with_state(state)
}

/// Wrapper handler for sign-up endpoint that uses State extractor
async fn sign_up_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::SignUpRequest>,
) -> Result<Json<crate::dto::auth::AuthSuccessResponse>> {
    crate::auth::handlers::sign_up_handler_inner(&state, req).await
}

/// Wrapper handler for sign-in endpoint that uses State extractor
async fn sign_in_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::SignInRequest>,
) -> Result<Json<crate::dto::auth::AuthSuccessResponse>> {
    crate::auth::handlers::sign_in_handler_inner(&state, req).await
}

/// Wrapper handler for passwordless sign-in
async fn passwordless_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::PasswordlessRequest>,
) -> Result<Json<crate::dto::auth::PasswordlessResponse>> {
    crate::auth::handlers::passwordless_handler_inner(&state, req).await
}

/// Wrapper handler for email verification
async fn verify_email_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::VerifyEmailRequest>,
) -> Result<Json<crate::dto::auth::AuthSuccessResponse>> {
    crate::auth::handlers::verify_email_handler_inner(&state, req).await
}

/// Wrapper handler for re-sending the email one-time code
async fn resend_otp_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::ResendOtpRequest>,
) -> Result<Json<crate::dto::auth::SuccessResponse>> {
    crate::auth::handlers::resend_otp_handler_inner(&state, req).await
}

/// Wrapper handler for external provider sign-in
async fn external_auth_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::ExternalAuthRequest>,
) -> Result<Json<crate::dto::auth::AuthSuccessResponse>> {
    crate::auth::handlers::external_auth_handler_inner(&state, req).await
}

/// Wrapper handler for token refresh
async fn refresh_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::RefreshRequest>,
) -> Result<Json<crate::dto::auth::AuthSuccessResponse>> {
    crate::auth::handlers::refresh_handler_inner(&state, req).await
}

/// Wrapper handler for logout
async fn logout_handler(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<crate::dto::auth::LogoutRequest>,
) -> Result<Json<crate::dto::auth::SuccessResponse>> {
    crate::auth::handlers::logout_handler_inner(&state, req).await
}

/// Wrapper handler for the authenticated last-message lookup
async fn last_message_handler(
    AxumState(state): AxumState<AppState>,
    Extension(authenticated_user): Extension<crate::middleware::auth::AuthenticatedUser>,
) -> Result<Json<crate::dto::users::LastMessageResponse>> {
    crate::auth::handlers::last_message_handler_inner(&state, authenticated_user).await
}

/// Creates the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check with uptime
async fn health_handler(
    AxumState(state): AxumState<AppState>,
) -> Json<crate::dto::users::HealthResponse> {
    Json(crate::dto::users::HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Creates the main application router
///
/// # Arguments
///
/// * `state` - Application state containing DB pool and config
///
/// # Returns
///
/// Main router with health checks and API routes
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .merge(create_health_router(state.clone()))
        .merge(create_router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
