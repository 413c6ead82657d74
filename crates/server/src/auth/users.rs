//! # User Store
//!
//! Persistence operations for user accounts. Handlers never touch the
//! users entity directly; every access goes through this module so the
//! auth-method and uniqueness rules live in one place.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use entity::users::{ActiveModel, AuthMethod, Column, ConnectionSet, Entity as UsersEntity, Model};
use error::{AppError, Result};
use rand::RngCore;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Finds a user by email.
pub async fn find_by_email(db: &DbConn, email: &str) -> Result<Option<Model>> {
    let user = UsersEntity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?;
    Ok(user)
}

/// Finds a user by id.
pub async fn find_by_id(db: &DbConn, id: Uuid) -> Result<Option<Model>> {
    let user = UsersEntity::find_by_id(id).one(db).await?;
    Ok(user)
}

/// Finds a user by external provider subject id.
pub async fn find_by_auth_id(db: &DbConn, auth_id: &str) -> Result<Option<Model>> {
    let user = UsersEntity::find()
        .filter(Column::AuthId.eq(auth_id))
        .one(db)
        .await?;
    Ok(user)
}

/// Creates an EMAIL-method user with a hashed password.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if the email is already registered.
pub async fn create_email_user(
    db: &DbConn,
    name: Option<String>,
    email: &str,
    password_hash: &str,
) -> Result<Model> {
    ensure_email_free(db, email).await?;

    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        auth_id: Set(None),
        auth_method: Set(AuthMethod::Email),
        email_verified: Set(false),
        last_message: Set(String::new()),
        connections: Set(ConnectionSet::default()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(user)
}

/// Creates a bare EMAIL-method user for passwordless sign-in.
///
/// The password field holds the raw email as a placeholder; it is not a
/// parseable hash, so it can never verify.
pub async fn create_passwordless_user(db: &DbConn, email: &str) -> Result<Model> {
    ensure_email_free(db, email).await?;

    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(None),
        email: Set(email.to_string()),
        password_hash: Set(email.to_string()),
        auth_id: Set(None),
        auth_method: Set(AuthMethod::Email),
        email_verified: Set(false),
        last_message: Set(String::new()),
        connections: Set(ConnectionSet::default()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(user)
}

/// Creates an EXTERNAL-method user linked to a provider subject id.
///
/// The password field holds a random placeholder that can never verify,
/// and `email_verified` mirrors the provider claim.
pub async fn create_external_user(
    db: &DbConn,
    name: Option<String>,
    email: &str,
    auth_id: &str,
    email_verified: bool,
) -> Result<Model> {
    ensure_email_free(db, email).await?;

    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email.to_string()),
        password_hash: Set(random_placeholder()),
        auth_id: Set(Some(auth_id.to_string())),
        auth_method: Set(AuthMethod::External),
        email_verified: Set(email_verified),
        last_message: Set(String::new()),
        connections: Set(ConnectionSet::default()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(user)
}

/// Flips `email_verified` and optionally records a display name.
pub async fn mark_verified(db: &DbConn, user: Model, name: Option<String>) -> Result<Model> {
    let mut active: ActiveModel = user.into();
    active.email_verified = Set(true);
    if let Some(name) = name {
        active.name = Set(Some(name));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    Ok(updated)
}

async fn ensure_email_free(db: &DbConn, email: &str) -> Result<()> {
    if find_by_email(db, email).await?.is_some() {
        return Err(AppError::conflict("User with this email already exists"));
    }
    Ok(())
}

/// Unguessable placeholder for accounts that never hold a real password.
fn random_placeholder() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
