//! # Authentication Primitives
//!
//! Credential building blocks for clipsync:
//! - Argon2id password hashing and verification
//! - JWT access/refresh token management with distinct signing secrets

pub mod jwt;
pub mod password;

// Re-export commonly used types
pub use jwt::{
    create_access_token,
    create_refresh_token,
    extract_bearer_token,
    validate_access_token,
    validate_refresh_token,
    Claims,
    JwtConfig,
    TokenError,
};
pub use password::{hash_password, verify_password, PasswordError};
pub use secrecy;
