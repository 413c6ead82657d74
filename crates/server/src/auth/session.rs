//! # Session Service
//!
//! Orchestrates the account lifecycle: sign-up, the three sign-in
//! pathways, email verification, token rotation and logout. Handlers
//! validate their DTOs and delegate here; this module composes the user
//! store, OTP manager, refresh-token store and the mail/identity
//! collaborators.

use ::auth::{
    create_access_token, create_refresh_token, hash_password, validate_refresh_token,
    verify_password,
    secrecy::{ExposeSecret, SecretString},
};
use entity::users::{AuthMethod, Model as UserModel};
use error::{AppError, Result};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{otp, refresh_tokens, users},
    dto::auth::AuthTokens,
    mail::MailAddress,
    AppState,
};

/// Issues a fresh access/refresh pair and stores the refresh hash,
/// replacing whatever token the user held before.
pub async fn issue_token_pair(state: &AppState, user: &UserModel) -> Result<AuthTokens> {
    let user_id = user.id.to_string();

    let access_token = create_access_token(&state.jwt_config, &user_id, &user.email)
        .map_err(|e| AppError::internal(format!("Failed to create access token: {e}")))?;
    let (refresh_token, expires_at) =
        create_refresh_token(&state.jwt_config, &user_id, &user.email)
            .map_err(|e| AppError::internal(format!("Failed to create refresh token: {e}")))?;

    refresh_tokens::store(&state.db, user.id, &refresh_token, expires_at).await?;

    Ok(AuthTokens {
        access_token,
        refresh_token,
        expires_in: (state.jwt_config.access_token_minutes * 60) as u64,
        token_type: "Bearer".to_string(),
    })
}

/// Registers an EMAIL-method account.
///
/// Creates the user, then issues and mails a verification code
/// (create-then-notify; a mail failure is logged, never surfaced) and
/// returns the user with a fresh token pair.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if the email is already registered.
pub async fn sign_up(
    state: &AppState,
    name: Option<String>,
    email: &str,
    password: &str,
) -> Result<(UserModel, AuthTokens)> {
    let password_hash = hash_password(&SecretString::from(password.to_string()))
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let user =
        users::create_email_user(&state.db, name, email, password_hash.expose_secret()).await?;

    send_verification_code(state, &user).await?;
    let tokens = issue_token_pair(state, &user).await?;

    info!(user_id = %user.id, "User signed up");
    Ok((user, tokens))
}

/// Password sign-in.
///
/// # Errors
///
/// - [`AppError::NotFound`] if no account holds this email
/// - [`AppError::AuthMethodMismatch`] for EXTERNAL-method accounts
/// - [`AppError::Unauthorized`] on password mismatch
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<(UserModel, AuthTokens)> {
    let user = users::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.auth_method == AuthMethod::External {
        return Err(AppError::auth_method_mismatch(
            "This account signs in through its identity provider",
        ));
    }

    verify_password(&SecretString::from(password.to_string()), &user.password_hash)
        .map_err(|_| AppError::unauthorized("Invalid credentials"))?;

    let tokens = issue_token_pair(state, &user).await?;
    info!(user_id = %user.id, "User signed in");
    Ok((user, tokens))
}

/// Starts a passwordless sign-in by mailing a one-time code.
///
/// Creates a bare account on first contact. Returns whether the caller
/// should be treated as new (no display name recorded yet).
///
/// # Errors
///
/// Returns [`AppError::AuthMethodMismatch`] for EXTERNAL-method accounts.
pub async fn sign_in_passwordless(state: &AppState, email: &str) -> Result<bool> {
    let user = match users::find_by_email(&state.db, email).await? {
        Some(user) if user.auth_method == AuthMethod::External => {
            return Err(AppError::auth_method_mismatch(
                "This account signs in through its identity provider",
            ));
        }
        Some(user) => user,
        None => users::create_passwordless_user(&state.db, email).await?,
    };

    send_verification_code(state, &user).await?;

    Ok(user.name.is_none())
}

/// Redeems an email one-time code, marking the address verified and
/// returning a fresh token pair.
///
/// # Errors
///
/// - [`AppError::NotFound`] if no account holds this email
/// - [`AppError::Unauthorized`] if the code is wrong, expired or used
pub async fn verify_email(
    state: &AppState,
    email: &str,
    code: &str,
    name: Option<String>,
) -> Result<(UserModel, AuthTokens)> {
    let user = users::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !otp::verify(&state.db, email, code).await? {
        return Err(AppError::unauthorized("Invalid or expired code"));
    }

    let user = users::mark_verified(&state.db, user, name).await?;
    let tokens = issue_token_pair(state, &user).await?;

    info!(user_id = %user.id, "Email verified");
    Ok((user, tokens))
}

/// Reissues and mails the one-time code for an existing account.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if no account holds this email.
pub async fn resend_otp(state: &AppState, email: &str) -> Result<()> {
    let user = users::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    send_verification_code(state, &user).await
}

/// External provider sign-in.
///
/// The provider token is exchanged for identity claims; the account is
/// matched on (auth_id AND email). A first contact creates an
/// EXTERNAL-method account, unless the email already belongs to an
/// EMAIL-method account.
///
/// # Errors
///
/// - [`AppError::ExternalAuth`] if the provider rejects the token or
///   the claims collide with a different external account
/// - [`AppError::AuthMethodMismatch`] if the email belongs to an
///   EMAIL-method account
pub async fn external_auth(state: &AppState, token: &str) -> Result<(UserModel, AuthTokens)> {
    let identity = state.identity.exchange(token).await?;

    let existing = entity::Users::find()
        .filter(entity::users::Column::AuthId.eq(identity.id.as_str()))
        .filter(entity::users::Column::Email.eq(identity.email.as_str()))
        .one(&state.db)
        .await?;

    let user = match existing {
        Some(user) => user,
        None => {
            match users::find_by_email(&state.db, &identity.email).await? {
                Some(collision) if collision.auth_method == AuthMethod::Email => {
                    return Err(AppError::auth_method_mismatch(
                        "This email signs in with a password or one-time code",
                    ));
                }
                Some(_) => {
                    // Same email, different provider subject.
                    return Err(AppError::external_auth(
                        "Identity does not match the existing account",
                    ));
                }
                None => {
                    users::create_external_user(
                        &state.db,
                        identity.name.clone(),
                        &identity.email,
                        &identity.id,
                        identity.email_verified,
                    )
                    .await?
                }
            }
        }
    };

    let tokens = issue_token_pair(state, &user).await?;
    info!(user_id = %user.id, "External sign-in");
    Ok((user, tokens))
}

/// Rotates a refresh token: the presented token is consumed and a fresh
/// pair is issued.
///
/// # Errors
///
/// Returns [`AppError::InvalidOrExpiredToken`] uniformly for badly
/// signed, unknown, already-rotated or expired tokens.
pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<(UserModel, AuthTokens)> {
    let claims = validate_refresh_token(&state.jwt_config, refresh_token)
        .map_err(|_| AppError::InvalidOrExpiredToken)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidOrExpiredToken)?;

    refresh_tokens::consume(&state.db, user_id, refresh_token).await?;

    let user = users::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    let tokens = issue_token_pair(state, &user).await?;
    Ok((user, tokens))
}

/// Revokes the presented refresh token. Idempotent; an unparseable
/// token simply has nothing to revoke.
pub async fn logout(state: &AppState, refresh_token: &str) -> Result<()> {
    let Ok(claims) = validate_refresh_token(&state.jwt_config, refresh_token) else {
        return Ok(());
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return Ok(());
    };

    refresh_tokens::revoke(&state.db, user_id, refresh_token).await?;
    info!(user_id = %user_id, "User logged out");
    Ok(())
}

/// Issues a one-time code and mails it; mail failure is logged, never
/// propagated.
async fn send_verification_code(state: &AppState, user: &UserModel) -> Result<()> {
    let code = otp::issue(&state.db, &user.email, state.otp_ttl_minutes).await?;

    let recipients = vec![MailAddress::new(user.name.clone(), &user.email)];
    let body = format!(
        "<p>Your clipsync verification code is <strong>{code}</strong>. \
         It expires in {} minutes.</p>",
        state.otp_ttl_minutes
    );

    if let Err(e) = state
        .mailer
        .send(&recipients, "Your clipsync verification code", &body)
        .await
    {
        warn!(user_id = %user.id, error = %e, "Verification mail failed");
    }

    Ok(())
}
