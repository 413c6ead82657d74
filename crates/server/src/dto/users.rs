//! # User Data Transfer Objects
//!
//! Response types for user-facing endpoints outside the auth flows.

use serde::{Deserialize, Serialize};

/// Response carrying the user's cached last message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessageResponse {
    /// Indicates operation success
    pub success: bool,

    /// The most recent message shared by any of the user's devices
    #[serde(rename = "lastMessage")]
    pub last_message: String,
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status, always "ok" when reachable
    pub status: String,

    /// Seconds since the server started
    pub uptime_seconds: u64,
}
