//! HTTP smoke tests against a running `tidi-web`.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The server running (cargo run -p tidi-web)
//!
//! Run with: `cargo test -p tidi-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect::Policy};
use serde_json::{Value, json};

use tidi_integration_tests::{base_url, unique_suffix};

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

#[tokio::test]
#[ignore = "Requires running tidi-web server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running tidi-web server"]
async fn test_verify_slug_shapes() {
    let client = client();
    let url = format!("{}/api/workspaces/verify-slug", base_url());

    let empty: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(empty, Value::Null);

    let free: Value = client
        .get(&url)
        .query(&[("slug", format!("free-{}", unique_suffix()))])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(free, json!({ "status": true }));
}

#[tokio::test]
#[ignore = "Requires running tidi-web server"]
async fn test_anonymous_requests_are_turned_away() {
    let client = client();

    let root = client.get(format!("{}/", base_url())).send().await.unwrap();
    assert_eq!(root.status(), StatusCode::SEE_OTHER);
    assert_eq!(root.headers()["location"], "/auth/sign-in");

    let api = client
        .get(format!("{}/api/workspaces", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running tidi-web server"]
async fn test_magic_generate_accepts_any_valid_email() {
    let resp = client()
        .post(format!("{}/api/magic-generate", base_url()))
        .json(&json!({ "email": format!("nobody-{}@example.com", unique_suffix()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running tidi-web server"]
async fn test_wrong_password_returns_to_sign_in_with_message() {
    let resp = client()
        .post(format!("{}/auth/sign-in", base_url()))
        .form(&[
            ("email", format!("nobody-{}@example.com", unique_suffix())),
            ("password", "wrong".to_string()),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("/auth/sign-in?email="));
    assert!(location.contains("error=Invalid%20email%20or%20password"));
}
