//! # Presence Registry
//!
//! Tracks which connection ids belong to each user and caches the last
//! shared message. The persisted set lives on the users row; every
//! mutation for a user runs under that user's async lock, and compound
//! sequences (prune plus add on connect) take the lock once for the
//! whole read-modify-write, so two devices connecting in the same
//! pruning window cannot lose each other's updates.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use chrono::Utc;
use entity::users::{ActiveModel, ConnectionSet, Entity as UsersEntity, Model};
use error::{AppError, Result};
use sea_orm::{ActiveModelTrait, DbConn, EntityTrait, Set};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::gateway::GatewayState;

/// Per-user presence state over the users table.
pub struct PresenceRegistry {
    db:    DbConn,
    /// Weak handles; a strong lock exists only while an operation for
    /// that user is in flight.
    locks: Mutex<HashMap<Uuid, Weak<Mutex<()>>>>,
}

impl PresenceRegistry {
    #[must_use]
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The serialization lock for one user's presence mutations.
    async fn lock_for(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        if let Some(live) = locks.get(&user_id).and_then(Weak::upgrade) {
            return live;
        }

        // A miss sweeps entries whose operations have all finished, so
        // the map never outgrows the set of users with in-flight work.
        locks.retain(|_, weak| weak.strong_count() > 0);

        let fresh = Arc::new(Mutex::new(()));
        locks.insert(user_id, Arc::downgrade(&fresh));
        fresh
    }

    async fn load(&self, user_id: Uuid) -> Result<Model> {
        UsersEntity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn save_connections(&self, user: Model, connections: ConnectionSet) -> Result<()> {
        let mut active: ActiveModel = user.into();
        active.connections = Set(connections);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Records a connection for the user. Idempotent.
    pub async fn add(&self, user_id: Uuid, conn_id: &str) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut connections = user.connections.clone();
        if connections.insert(conn_id) {
            debug!(user_id = %user_id, conn_id = %conn_id, "Connection added");
            self.save_connections(user, connections).await?;
        }
        Ok(())
    }

    /// Drops stored ids that no live gateway socket backs and records the
    /// new connection, in one write under one lock acquisition. Stale ids
    /// left behind by crashed processes disappear here; a concurrently
    /// connecting device is already registered with the gateway, so it is
    /// never treated as stale.
    pub async fn prune_and_add(
        &self,
        user_id: Uuid,
        gateway: &GatewayState,
        conn_id: &str,
    ) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut connections = ConnectionSet::default();
        for stored in &user.connections.0 {
            if gateway.is_connection_active(stored).await {
                connections.insert(stored);
            }
        }

        let pruned = user.connections.len() - connections.len();
        if pruned > 0 {
            debug!(user_id = %user_id, pruned, "Stale connections pruned");
        }

        connections.insert(conn_id);
        if connections != user.connections {
            debug!(user_id = %user_id, conn_id = %conn_id, "Connection added");
            self.save_connections(user, connections).await?;
        }
        Ok(())
    }

    /// Drops a connection for the user. A no-op if the id is absent.
    pub async fn remove(&self, user_id: Uuid, conn_id: &str) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut connections = user.connections.clone();
        if connections.remove(conn_id) {
            debug!(user_id = %user_id, conn_id = %conn_id, "Connection removed");
            self.save_connections(user, connections).await?;
        }
        Ok(())
    }

    /// Atomically overwrites the user's connection set, collapsing
    /// duplicate ids.
    pub async fn replace(&self, user_id: Uuid, conn_ids: Vec<String>) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let mut connections = ConnectionSet::default();
        for conn_id in &conn_ids {
            connections.insert(conn_id);
        }

        let user = self.load(user_id).await?;
        self.save_connections(user, connections).await
    }

    /// Current connection ids for the user.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<String>> {
        Ok(self.load(user_id).await?.connections.0)
    }

    /// Persists the user's most recent shared message.
    pub async fn set_last_message(&self, user_id: Uuid, message: &str) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut active: ActiveModel = user.into();
        active.last_message = Set(message.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    /// The cached last message, empty until something is shared.
    pub async fn get_last_message(&self, user_id: Uuid) -> Result<String> {
        Ok(self.load(user_id).await?.last_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry() -> PresenceRegistry {
        let db = sea_orm::Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        PresenceRegistry::new(db)
    }

    #[tokio::test]
    async fn test_lock_is_shared_while_held() {
        let registry = registry().await;
        let user_id = Uuid::new_v4();

        let first = registry.lock_for(user_id).await;
        let second = registry.lock_for(user_id).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_idle_lock_entries_are_swept() {
        let registry = registry().await;

        for _ in 0..32 {
            let lock = registry.lock_for(Uuid::new_v4()).await;
            let _guard = lock.lock().await;
        }

        // The next miss sweeps every entry whose operation has finished.
        let _ = registry.lock_for(Uuid::new_v4()).await;

        let locks = registry.locks.lock().await;
        assert!(
            locks.len() <= 1,
            "idle lock entries must be swept, found {}",
            locks.len()
        );
    }
}
