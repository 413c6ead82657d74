//! # Refresh Token Store
//!
//! Persists the single live refresh token per user as a BLAKE3 hash.
//! Issuing upserts on `user_id`, so every previously issued token dies
//! the moment a new one is stored. Redemption is a conditional delete;
//! under concurrent replays of the same token exactly one caller wins.

use chrono::{DateTime, Utc};
use entity::refresh_tokens::{ActiveModel, Column, Entity as RefreshTokensEntity};
use error::{AppError, Result};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DbConn, EntityTrait, QueryFilter, Set,
};
use tracing::debug;
use uuid::Uuid;

/// BLAKE3 hex digest of a token string.
#[must_use]
pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Stores the hash of a freshly issued refresh token, replacing any
/// previous row for the user.
pub async fn store(
    db: &DbConn,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let model = ActiveModel {
        user_id: Set(user_id),
        token_hash: Set(hash_token(token)),
        expires_at: Set(expires_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    RefreshTokensEntity::insert(model)
        .on_conflict(
            OnConflict::column(Column::UserId)
                .update_columns([Column::TokenHash, Column::ExpiresAt, Column::CreatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;

    debug!(user_id = %user_id, "Refresh token stored");
    Ok(())
}

/// Consumes the stored token during rotation.
///
/// The conditional delete only matches a live row holding this exact
/// token hash; `rows_affected == 1` is the single-winner guarantee.
///
/// # Errors
///
/// Returns [`AppError::InvalidOrExpiredToken`] when the token is
/// unknown, already rotated, or past expiry.
pub async fn consume(db: &DbConn, user_id: Uuid, token: &str) -> Result<()> {
    let result = RefreshTokensEntity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TokenHash.eq(hash_token(token)))
        .filter(Column::ExpiresAt.gt(Utc::now()))
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        return Err(AppError::InvalidOrExpiredToken);
    }
    Ok(())
}

/// Revokes the row matching this exact token, if any. Idempotent, so a
/// stale token cannot knock out a newer session and a repeated logout
/// is a no-op.
pub async fn revoke(db: &DbConn, user_id: Uuid, token: &str) -> Result<()> {
    RefreshTokensEntity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TokenHash.eq(hash_token(token)))
        .exec(db)
        .await?;
    Ok(())
}

/// Removes expired rows. Hygiene only; expired rows already fail
/// `consume` on their own.
pub async fn cleanup_expired(db: &DbConn) -> Result<u64> {
    let result = RefreshTokensEntity::delete_many()
        .filter(Column::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_and_distinct() {
        let a = hash_token("token-a");
        assert_eq!(a, hash_token("token-a"));
        assert_ne!(a, hash_token("token-b"));
        // blake3 hex digest
        assert_eq!(a.len(), 64);
    }
}
