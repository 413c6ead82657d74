//! # OTP Challenge Manager
//!
//! Issues and redeems short-lived one-time codes for email verification
//! and passwordless sign-in. At most one valid code exists per email
//! because issuing deletes any prior rows first, and redemption deletes
//! the matched row, so a code can be used exactly once.

use chrono::{Duration, Utc};
use entity::otp_challenges::{ActiveModel, Column, Entity as OtpEntity};
use error::Result;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, ModelTrait, QueryFilter, Set};
use tracing::debug;

/// Issues a fresh 6-digit code for the email, invalidating prior codes.
///
/// Returns the code for delivery; it is never logged in full.
pub async fn issue(db: &DbConn, email: &str, ttl_minutes: i64) -> Result<String> {
    OtpEntity::delete_many()
        .filter(Column::Email.eq(email))
        .exec(db)
        .await?;

    // Uniform over [0, 10^6); leading zeros are significant.
    let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
    let now = Utc::now();

    ActiveModel {
        email: Set(email.to_string()),
        code: Set(code.clone()),
        expires_at: Set(now + Duration::minutes(ttl_minutes)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(email = %email, "OTP challenge issued");
    Ok(code)
}

/// Redeems a code for the email.
///
/// Returns false when no exact (email, code) match exists or the match
/// has expired; the two cases are indistinguishable to the caller.
/// Success deletes the row, and the delete is the arbiter under
/// concurrency: whoever removes the row wins, everyone else gets false.
pub async fn verify(db: &DbConn, email: &str, code: &str) -> Result<bool> {
    let challenge = OtpEntity::find()
        .filter(Column::Email.eq(email))
        .filter(Column::Code.eq(code))
        .one(db)
        .await?;

    let Some(challenge) = challenge else {
        return Ok(false);
    };

    if challenge.expires_at <= Utc::now() {
        return Ok(false);
    }

    let deleted = challenge.delete(db).await?;
    Ok(deleted.rows_affected == 1)
}

/// Removes expired challenges. Hygiene only; correctness never depends
/// on it because `verify` checks expiry itself.
pub async fn cleanup_expired(db: &DbConn) -> Result<u64> {
    let result = OtpEntity::delete_many()
        .filter(Column::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
