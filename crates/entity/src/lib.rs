//! # Database Entities
//!
//! SeaORM entity definitions for the clipsync schema.

pub mod otp_challenges;
pub mod refresh_tokens;
pub mod users;

pub use otp_challenges::Entity as OtpChallenges;
pub use refresh_tokens::Entity as RefreshTokens;
pub use users::Entity as Users;
pub use users::{AuthMethod, ConnectionSet};
