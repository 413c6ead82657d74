//! Refresh Tokens Entity
//!
//! One live refresh token per user. The token itself is never stored,
//! only its BLAKE3 hash; rotation replaces the row atomically.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owning user; unique, so an upsert on this column is a rotation.
    pub user_id: Uuid,
    /// BLAKE3 hash of the opaque token string.
    pub token_hash: String,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
