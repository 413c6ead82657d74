//! # Authentication Middleware
//!
//! JWT authentication middleware for protecting API endpoints.

use ::auth::{extract_bearer_token, validate_access_token};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

/// User information extracted from the access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID
    pub id:    Uuid,
    /// User email
    pub email: String,
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the access token signature and expiry
/// 3. Adds authenticated user info to request extensions
/// 4. Rejects requests with invalid/missing tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        Some(header) => match header.to_str() {
            Ok(h) => h,
            Err(_) => {
                return create_auth_error_response("Invalid authorization header encoding");
            }
        },
        None => {
            return create_auth_error_response("Missing authorization header");
        }
    };

    let token = match extract_bearer_token(auth_header) {
        Some(token) => token,
        None => {
            return create_auth_error_response("Invalid authorization header format");
        }
    };

    let claims = match validate_access_token(&state.jwt_config, &token) {
        Ok(claims) => claims,
        Err(e) => {
            let error_msg = e.to_string().to_lowercase();
            if error_msg.contains("expired") {
                return create_auth_error_response("Token has expired");
            }
            return create_auth_error_response("Invalid token");
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(user_id) => user_id,
        Err(_) => {
            return create_auth_error_response("Invalid token");
        }
    };

    request.extensions_mut().insert(AuthenticatedUser {
        id:    user_id,
        email: claims.email,
    });

    next.run(request).await
}

/// Create standardized authentication error response
fn create_auth_error_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        axum::Json(json!({
            "success": false,
            "code": "AUTHENTICATION_ERROR",
            "message": message
        })),
    )
        .into_response()
}
