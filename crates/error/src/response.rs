//! # API Error Responses
//!
//! Maps [`AppError`](crate::AppError) onto the JSON error format used by all
//! endpoints.
//!
//! ## Response Format
//!
//! ```json
//! {
//!   "success": false,
//!   "code": "UNAUTHORIZED",
//!   "message": "Invalid email or password"
//! }
//! ```

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::AppError;

/// JSON body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,

    /// Machine-readable error code.
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    /// Build the wire body for an error, hiding server-side detail.
    #[must_use]
    pub fn from_error(err: &AppError) -> Self {
        let message = if err.expose_details() {
            err.to_string()
        } else {
            "Internal server error".to_string()
        };

        Self {
            success: false,
            code: err.code().to_string(),
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody::from_error(&self);

        if !self.expose_details() {
            tracing::error!(code = %self.code(), error = %self, "Request failed");
        }

        (status, axum::Json(body)).into_response()
    }
}
