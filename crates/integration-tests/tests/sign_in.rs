//! Password and one-time code sign-in against a real database.
//!
//! Run with: `cargo test -p tidi-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use chrono::Duration;

use tidi_core::Email;
use tidi_integration_tests::{CapturedCodes, TestContext, unique_suffix};
use tidi_web::db::UserRepository;
use tidi_web::services::auth::{MAX_CODE_ATTEMPTS, hash_secret};
use tidi_web::services::{AuthError, AuthService};

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_code_signs_in_exactly_once() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));
    let user = ctx.create_user().await;

    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let code = delivery.last_for(&user.email).expect("code delivered");
    assert_eq!(code.len(), 6);

    let signed_in = auth
        .sign_in_with_code(user.email.as_str(), &code)
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);

    let reused = auth.sign_in_with_code(user.email.as_str(), &code).await;
    assert!(matches!(reused, Err(AuthError::InvalidCode)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_new_code_retires_previous_one() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));
    let user = ctx.create_user().await;

    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let first = delivery.last_for(&user.email).unwrap();
    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let second = delivery.last_for(&user.email).unwrap();

    if first != second {
        let stale = auth.sign_in_with_code(user.email.as_str(), &first).await;
        assert!(matches!(stale, Err(AuthError::InvalidCode)));
    }
    assert!(auth.sign_in_with_code(user.email.as_str(), &second).await.is_ok());
}

/// A six digit code that is not `code`.
fn wrong_code(code: &str) -> &'static str {
    if code == "000000" { "111111" } else { "000000" }
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_code_is_retired_after_too_many_wrong_guesses() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));
    let user = ctx.create_user().await;

    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let code = delivery.last_for(&user.email).unwrap();

    for _ in 0..MAX_CODE_ATTEMPTS {
        let guess = auth
            .sign_in_with_code(user.email.as_str(), wrong_code(&code))
            .await;
        assert!(matches!(guess, Err(AuthError::InvalidCode)));
    }

    let result = auth.sign_in_with_code(user.email.as_str(), &code).await;
    assert!(matches!(result, Err(AuthError::InvalidCode)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_code_survives_fewer_wrong_guesses() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));
    let user = ctx.create_user().await;

    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let code = delivery.last_for(&user.email).unwrap();

    for _ in 1..MAX_CODE_ATTEMPTS {
        let guess = auth
            .sign_in_with_code(user.email.as_str(), wrong_code(&code))
            .await;
        assert!(matches!(guess, Err(AuthError::InvalidCode)));
    }

    let signed_in = auth
        .sign_in_with_code(user.email.as_str(), &code)
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_expired_code_is_rejected() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(-1));
    let user = ctx.create_user().await;

    auth.request_sign_in_code(user.email.as_str()).await.unwrap();
    let code = delivery.last_for(&user.email).unwrap();

    let result = auth.sign_in_with_code(user.email.as_str(), &code).await;
    assert!(matches!(result, Err(AuthError::InvalidCode)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_unknown_email_gets_no_code() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));

    let email = format!("nobody-{}@example.com", unique_suffix());
    auth.request_sign_in_code(&email).await.unwrap();

    assert!(delivery.last_for(&Email::parse(&email).unwrap()).is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_password_sign_in() {
    let ctx = TestContext::new().await;
    let delivery = CapturedCodes::default();
    let auth = AuthService::new(&ctx.pool, &delivery, Duration::minutes(10));
    let user = ctx.create_user().await;

    UserRepository::new(&ctx.pool)
        .set_password_hash(user.id, &hash_secret("correct horse battery").unwrap())
        .await
        .unwrap();

    let signed_in = auth
        .login_with_password(user.email.as_str(), "correct horse battery")
        .await
        .unwrap();
    assert_eq!(signed_in.id, user.id);

    let wrong = auth.login_with_password(user.email.as_str(), "wrong horse").await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    let malformed = auth.login_with_password("not-an-email", "whatever").await;
    assert!(matches!(malformed, Err(AuthError::InvalidEmail(_))));
}
