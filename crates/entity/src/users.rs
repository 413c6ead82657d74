//! Users Entity
//!
//! Identity record for clipsync accounts. Besides the credential fields it
//! carries the sync state the realtime gateway needs: the set of live
//! connection ids and the last shared message.

use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Display name; absent until sign-up or email verification supplies one.
    pub name: Option<String>,
    /// Globally unique.
    pub email: String,
    /// Argon2id PHC string for EMAIL accounts; an opaque placeholder for
    /// passwordless and external accounts (never verifiable).
    pub password_hash: String,
    /// External provider subject id; globally unique when present.
    pub auth_id: Option<String>,
    /// Immutable once chosen.
    pub auth_method: AuthMethod,
    pub email_verified: bool,
    /// Last shared message, cached for late-joining devices.
    pub last_message: String,
    /// Live realtime connection ids (set semantics).
    pub connections: ConnectionSet,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Authentication pathway for an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AuthMethod {
    /// Password or passwordless OTP sign-in.
    #[sea_orm(string_value = "email")]
    Email,
    /// Third-party identity provider.
    #[sea_orm(string_value = "external")]
    External,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Email => write!(f, "email"),
            AuthMethod::External => write!(f, "external"),
        }
    }
}

/// JSON-backed set of connection identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ConnectionSet(pub Vec<String>);

impl ConnectionSet {
    /// Insert with set semantics; returns true if the set changed.
    pub fn insert(&mut self, conn_id: &str) -> bool {
        if self.0.iter().any(|c| c == conn_id) {
            return false;
        }
        self.0.push(conn_id.to_string());
        true
    }

    /// Remove if present; returns true if the set changed.
    pub fn remove(&mut self, conn_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != conn_id);
        self.0.len() != before
    }

    pub fn contains(&self, conn_id: &str) -> bool {
        self.0.iter().any(|c| c == conn_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
