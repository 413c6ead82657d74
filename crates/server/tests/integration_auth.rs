//! Integration tests for the account lifecycle: sign-up, the three
//! sign-in pathways, email verification and OTP handling.

mod common;

use chrono::{Duration, Utc};
use entity::users::AuthMethod;
use error::AppError;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use server::auth::{otp, session, users};
use server::external::ExternalIdentity;

use common::UserFixture;

async fn otp_row_id(db: &sea_orm::DbConn) -> Option<i32> {
    entity::OtpChallenges::find()
        .one(db)
        .await
        .expect("otp query")
        .map(|row| row.id)
}

#[tokio::test]
async fn test_sign_up_creates_unverified_user_with_tokens() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();

    let (user, tokens) = session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");

    assert_eq!(user.email, fixture.email);
    assert_eq!(user.auth_method, AuthMethod::Email);
    assert!(!user.email_verified);
    assert!(!tokens.access_token.is_empty());
    assert_eq!(tokens.token_type, "Bearer");

    // One OTP challenge was issued for the verification mail.
    assert!(otp_row_id(&state.db).await.is_some());
}

#[tokio::test]
async fn test_duplicate_sign_up_conflicts_without_side_effects() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();

    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("first sign up");
    let first_otp = otp_row_id(&state.db).await.expect("otp row");

    let result = session::sign_up(
        &state,
        Some("Other Name".to_string()),
        &fixture.email,
        "AnotherPassword1!",
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));

    // No second user, and the original OTP challenge was not reissued.
    let user_count = entity::Users::find().count(&state.db).await.unwrap();
    assert_eq!(user_count, 1);
    assert_eq!(otp_row_id(&state.db).await, Some(first_otp));
}

#[tokio::test]
async fn test_sign_in_happy_path_and_failures() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();

    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");

    let (user, tokens) = session::sign_in(&state, &fixture.email, &fixture.password)
        .await
        .expect("sign in");
    assert_eq!(user.email, fixture.email);
    assert!(!tokens.refresh_token.is_empty());

    let unknown = session::sign_in(&state, "nobody@example.com", "whatever").await;
    assert!(matches!(unknown, Err(AppError::NotFound { .. })));

    let wrong = session::sign_in(&state, &fixture.email, "WrongPassword!").await;
    assert!(matches!(wrong, Err(AppError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_sign_in_rejects_external_accounts() {
    let state = common::test_state().await;

    users::create_external_user(&state.db, None, "ext@example.com", "ext-sub-1", true)
        .await
        .expect("external user");

    let result = session::sign_in(&state, "ext@example.com", "any-password").await;
    assert!(matches!(result, Err(AppError::AuthMethodMismatch { .. })));

    let passwordless = session::sign_in_passwordless(&state, "ext@example.com").await;
    assert!(matches!(
        passwordless,
        Err(AppError::AuthMethodMismatch { .. })
    ));
}

#[tokio::test]
async fn test_passwordless_creates_bare_account() {
    let state = common::test_state().await;

    let is_new = session::sign_in_passwordless(&state, "fresh@example.com")
        .await
        .expect("passwordless");
    assert!(is_new);

    let user = users::find_by_email(&state.db, "fresh@example.com")
        .await
        .unwrap()
        .expect("user created");
    assert!(user.name.is_none());
    assert_eq!(user.auth_method, AuthMethod::Email);
    // The placeholder password can never verify.
    assert_eq!(user.password_hash, "fresh@example.com");

    assert!(otp_row_id(&state.db).await.is_some());

    // A named account is no longer "new".
    let fixture = UserFixture::new().with_email("named@example.com");
    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");
    let is_new = session::sign_in_passwordless(&state, "named@example.com")
        .await
        .expect("passwordless");
    assert!(!is_new);
}

#[tokio::test]
async fn test_verify_email_is_single_use() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();

    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");

    let code = otp::issue(&state.db, &fixture.email, 10).await.expect("otp");

    let (user, tokens) = session::verify_email(
        &state,
        &fixture.email,
        &code,
        Some("Verified Name".to_string()),
    )
    .await
    .expect("verify");

    assert!(user.email_verified);
    assert_eq!(user.name.as_deref(), Some("Verified Name"));
    assert!(!tokens.access_token.is_empty());

    // The code was consumed by the first redemption.
    let replay = session::verify_email(&state, &fixture.email, &code, None).await;
    assert!(matches!(replay, Err(AppError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_verify_email_rejects_wrong_and_expired_codes() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();

    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");

    let result = session::verify_email(&state, &fixture.email, "000000", None).await;
    assert!(matches!(result, Err(AppError::Unauthorized { .. })));

    // Plant an already-expired challenge.
    entity::OtpChallenges::delete_many()
        .exec(&state.db)
        .await
        .unwrap();
    entity::otp_challenges::ActiveModel {
        email: Set(fixture.email.clone()),
        code: Set("123456".to_string()),
        expires_at: Set(Utc::now() - Duration::minutes(1)),
        created_at: Set(Utc::now() - Duration::minutes(11)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .unwrap();

    let expired = session::verify_email(&state, &fixture.email, "123456", None).await;
    assert!(matches!(expired, Err(AppError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_issue_replaces_prior_challenge() {
    let state = common::test_state().await;

    let first = otp::issue(&state.db, "otp@example.com", 10).await.unwrap();
    let second = otp::issue(&state.db, "otp@example.com", 10).await.unwrap();

    // Only the latest challenge is redeemable.
    let count = entity::OtpChallenges::find().count(&state.db).await.unwrap();
    assert_eq!(count, 1);
    if first != second {
        assert!(!otp::verify(&state.db, "otp@example.com", &first).await.unwrap());
    }
    assert!(otp::verify(&state.db, "otp@example.com", &second).await.unwrap());
}

#[tokio::test]
async fn test_resend_otp_requires_existing_account() {
    let state = common::test_state().await;

    let missing = session::resend_otp(&state, "nobody@example.com").await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));

    let fixture = UserFixture::new();
    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");
    let first = otp_row_id(&state.db).await.expect("otp row");

    session::resend_otp(&state, &fixture.email).await.expect("resend");
    let second = otp_row_id(&state.db).await.expect("otp row");
    assert_ne!(first, second, "resend must replace the stored challenge");
}

#[tokio::test]
async fn test_external_auth_creates_and_links_account() {
    let identity = ExternalIdentity {
        id: "ext-sub-42".to_string(),
        email: "ext42@example.com".to_string(),
        name: Some("External User".to_string()),
        email_verified: true,
    };
    let state = common::test_state_with_identity(identity).await;

    let (created, tokens) = session::external_auth(&state, "provider-token")
        .await
        .expect("first external auth");
    assert_eq!(created.auth_method, AuthMethod::External);
    assert_eq!(created.auth_id.as_deref(), Some("ext-sub-42"));
    assert!(created.email_verified);
    assert!(!tokens.access_token.is_empty());

    // Second exchange links to the same account.
    let (linked, _) = session::external_auth(&state, "provider-token")
        .await
        .expect("second external auth");
    assert_eq!(linked.id, created.id);

    let count = entity::Users::find().count(&state.db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_external_auth_rejects_email_method_collision() {
    let identity = ExternalIdentity {
        id: "ext-sub-77".to_string(),
        email: "test@example.com".to_string(),
        name: None,
        email_verified: true,
    };
    let state = common::test_state_with_identity(identity).await;

    let fixture = UserFixture::new();
    session::sign_up(&state, fixture.name, &fixture.email, &fixture.password)
        .await
        .expect("sign up");

    let result = session::external_auth(&state, "provider-token").await;
    assert!(matches!(result, Err(AppError::AuthMethodMismatch { .. })));

    // No shadow account was created.
    let count = entity::Users::find().count(&state.db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_external_auth_provider_rejection() {
    let state = common::test_state().await;

    let result = session::external_auth(&state, "any-token").await;
    assert!(matches!(result, Err(AppError::ExternalAuth { .. })));
}
