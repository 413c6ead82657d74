//! # Authentication Handlers
//!
//! HTTP request handlers for the auth endpoints. Each handler validates
//! its DTO, delegates to the session service and shapes the response.

use axum::Json;
use error::{AppError, Result};
use validator::Validate;

use crate::{
    auth::session,
    dto::auth::{
        AuthSuccessResponse, ExternalAuthRequest, LogoutRequest, PasswordlessRequest,
        RefreshRequest, ResendOtpRequest, SignInRequest, SignUpRequest, SuccessResponse,
        UserInfo, VerifyEmailRequest,
    },
    dto::users::LastMessageResponse,
    middleware::auth::AuthenticatedUser,
    AppState,
};

fn validated<T: Validate>(req: T) -> Result<T> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    Ok(req)
}

/// Register a new account with email and password
pub async fn sign_up_handler_inner(
    state: &AppState,
    req: SignUpRequest,
) -> Result<Json<AuthSuccessResponse>> {
    let req = validated(req)?;
    let (user, tokens) = session::sign_up(state, req.name, &req.email, &req.password).await?;

    Ok(Json(AuthSuccessResponse {
        success: true,
        user: UserInfo::from(&user),
        tokens: Some(tokens),
    }))
}

/// Sign in with email and password
pub async fn sign_in_handler_inner(
    state: &AppState,
    req: SignInRequest,
) -> Result<Json<AuthSuccessResponse>> {
    let req = validated(req)?;
    let (user, tokens) = session::sign_in(state, &req.email, &req.password).await?;

    Ok(Json(AuthSuccessResponse {
        success: true,
        user: UserInfo::from(&user),
        tokens: Some(tokens),
    }))
}

/// Start a passwordless sign-in by mailing a one-time code
pub async fn passwordless_handler_inner(
    state: &AppState,
    req: PasswordlessRequest,
) -> Result<Json<crate::dto::auth::PasswordlessResponse>> {
    let req = validated(req)?;
    let is_new = session::sign_in_passwordless(state, &req.email).await?;

    Ok(Json(crate::dto::auth::PasswordlessResponse {
        success: true,
        is_new,
        message: "Verification code sent".to_string(),
    }))
}

/// Redeem an email one-time code
pub async fn verify_email_handler_inner(
    state: &AppState,
    req: VerifyEmailRequest,
) -> Result<Json<AuthSuccessResponse>> {
    let req = validated(req)?;
    let (user, tokens) = session::verify_email(state, &req.email, &req.code, req.name).await?;

    Ok(Json(AuthSuccessResponse {
        success: true,
        user: UserInfo::from(&user),
        tokens: Some(tokens),
    }))
}

/// Re-send the email one-time code
pub async fn resend_otp_handler_inner(
    state: &AppState,
    req: ResendOtpRequest,
) -> Result<Json<SuccessResponse>> {
    let req = validated(req)?;
    session::resend_otp(state, &req.email).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Verification code sent".to_string(),
    }))
}

/// Sign in with an external provider token
pub async fn external_auth_handler_inner(
    state: &AppState,
    req: ExternalAuthRequest,
) -> Result<Json<AuthSuccessResponse>> {
    let req = validated(req)?;
    let (user, tokens) = session::external_auth(state, &req.token).await?;

    Ok(Json(AuthSuccessResponse {
        success: true,
        user: UserInfo::from(&user),
        tokens: Some(tokens),
    }))
}

/// Rotate a refresh token
pub async fn refresh_handler_inner(
    state: &AppState,
    req: RefreshRequest,
) -> Result<Json<AuthSuccessResponse>> {
    let req = validated(req)?;
    let (user, tokens) = session::refresh(state, &req.refresh_token).await?;

    Ok(Json(AuthSuccessResponse {
        success: true,
        user: UserInfo::from(&user),
        tokens: Some(tokens),
    }))
}

/// Revoke a refresh token
pub async fn logout_handler_inner(
    state: &AppState,
    req: LogoutRequest,
) -> Result<Json<SuccessResponse>> {
    let req = validated(req)?;
    session::logout(state, &req.refresh_token).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Logged out".to_string(),
    }))
}

/// Return the authenticated user's cached last message
pub async fn last_message_handler_inner(
    state: &AppState,
    user: AuthenticatedUser,
) -> Result<Json<LastMessageResponse>> {
    let last_message = state.presence.get_last_message(user.id).await?;

    Ok(Json(LastMessageResponse {
        success: true,
        last_message,
    }))
}
