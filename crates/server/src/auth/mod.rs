//! # Session Lifecycle
//!
//! Account, credential and token management:
//!
//! - [`users`]: user store
//! - [`otp`]: one-time code challenges
//! - [`refresh_tokens`]: refresh token storage and rotation
//! - [`session`]: orchestration of the auth flows
//! - [`handlers`]: HTTP handlers over the session service

pub mod handlers;
pub mod otp;
pub mod refresh_tokens;
pub mod session;
pub mod users;
