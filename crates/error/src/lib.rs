//! # Clipsync Error Infrastructure
//!
//! Error types and API response handling for the clipsync application.

pub mod response;

pub use response::ErrorBody;

/// Convenience type alias for Result with AppError.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Main application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("NotFound: {message}")]
    NotFound { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The account exists but was registered through the other
    /// authentication pathway (email vs external provider).
    #[error("AuthMethodMismatch: {message}")]
    AuthMethodMismatch { message: String },

    /// The external identity provider rejected the presented token or
    /// returned an unusable response.
    #[error("ExternalAuth: {message}")]
    ExternalAuth { message: String },

    /// Uniform failure for the refresh path: unknown, expired, consumed,
    /// or badly signed refresh tokens are indistinguishable to the caller.
    #[error("InvalidOrExpiredToken: Invalid or expired refresh token")]
    InvalidOrExpiredToken,

    #[error("Validation: {message}")]
    Validation { message: String },

    #[error("Database: {message}")]
    Database { message: String },

    #[error("Config: {message}")]
    Config { message: String },

    #[error("Internal: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a not found error.
    #[inline]
    pub fn not_found(message: impl ToString) -> Self {
        Self::NotFound {
            message: message.to_string(),
        }
    }

    /// Create an unauthorized error.
    #[inline]
    pub fn unauthorized(message: impl ToString) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
        }
    }

    /// Create a conflict error.
    #[inline]
    pub fn conflict(message: impl ToString) -> Self {
        Self::Conflict {
            message: message.to_string(),
        }
    }

    /// Create an auth-method mismatch error.
    #[inline]
    pub fn auth_method_mismatch(message: impl ToString) -> Self {
        Self::AuthMethodMismatch {
            message: message.to_string(),
        }
    }

    /// Create an external-auth failure.
    #[inline]
    pub fn external_auth(message: impl ToString) -> Self {
        Self::ExternalAuth {
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    #[inline]
    pub fn validation(message: impl ToString) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Create a database error.
    #[inline]
    pub fn database(message: impl ToString) -> Self {
        Self::Database {
            message: message.to_string(),
        }
    }

    /// Create a config error.
    #[inline]
    pub fn config(message: impl ToString) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> http::StatusCode {
        match self {
            AppError::NotFound { .. } => http::StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => http::StatusCode::UNAUTHORIZED,
            AppError::Conflict { .. } => http::StatusCode::CONFLICT,
            AppError::AuthMethodMismatch { .. } => http::StatusCode::CONFLICT,
            AppError::ExternalAuth { .. } => http::StatusCode::UNAUTHORIZED,
            AppError::InvalidOrExpiredToken => http::StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => http::StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Unauthorized { .. } => "UNAUTHORIZED",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::AuthMethodMismatch { .. } => "AUTH_METHOD_MISMATCH",
            AppError::ExternalAuth { .. } => "EXTERNAL_AUTH_ERROR",
            AppError::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Database { .. } => "DATABASE_ERROR",
            AppError::Config { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the message is safe to expose to API clients.
    ///
    /// Server-side failures are reported with a generic message; client
    /// errors carry their original detail.
    pub fn expose_details(&self) -> bool {
        !matches!(
            self,
            AppError::Database { .. } | AppError::Config { .. } | AppError::Internal { .. }
        )
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::database(err)
    }
}
