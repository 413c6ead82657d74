//! # Authentication Data Transfer Objects
//!
//! Request and response types for authentication endpoints. Requests are
//! validated explicitly before the session service is invoked.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for password sign-up
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Display name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,

    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// User's password
    #[validate(length(
        min = 8,
        max = 256,
        message = "Password must be between 8 and 256 characters"
    ))]
    pub password: String,
}

/// Request body for password sign-in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SignInRequest {
    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// User's password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for passwordless sign-in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct PasswordlessRequest {
    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Request body for email verification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Six-digit one-time code, leading zeros included
    #[validate(length(equal = 6, message = "Code must be exactly 6 digits"))]
    pub code: String,

    /// Display name to record on first verification
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
}

/// Request body for re-sending the email one-time code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ResendOtpRequest {
    /// User's email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Request body for external provider sign-in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ExternalAuthRequest {
    /// Provider-issued bearer token
    #[validate(length(min = 1, message = "Provider token is required"))]
    pub token: String,
}

/// Request body for token refresh
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct RefreshRequest {
    /// The refresh token to rotate
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Request body for logout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct LogoutRequest {
    /// The refresh token to revoke
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response containing authentication tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// JWT access token for API requests
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Access token expiration time in seconds
    pub expires_in: u64,

    /// Token type (always "Bearer")
    #[serde(rename = "tokenType")]
    pub token_type: String,
}

/// User information returned after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Unique user identifier
    pub id: String,

    /// User's email address
    pub email: String,

    /// User's display name
    pub name: Option<String>,

    /// Whether the email address has been verified
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
}

impl From<&entity::users::Model> for UserInfo {
    fn from(user: &entity::users::Model) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            email_verified: user.email_verified,
        }
    }
}

/// Success response for authentication operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccessResponse {
    /// Indicates operation success
    pub success: bool,

    /// Authenticated user information
    pub user: UserInfo,

    /// Authentication tokens, absent for flows that defer to OTP
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tokens: Option<AuthTokens>,
}

/// Response for passwordless sign-in initiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordlessResponse {
    /// Indicates operation success
    pub success: bool,

    /// Whether the account was created by this request
    #[serde(rename = "isNew")]
    pub is_new: bool,

    /// Human-readable message
    pub message: String,
}

/// Generic success response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Indicates operation success
    pub success: bool,

    /// Human-readable message
    pub message: String,
}
