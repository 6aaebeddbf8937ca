//! Proposal pickers through the router, against a real database.
//!
//! Sessions live in memory; users, workspaces and catalog rows in
//! `PostgreSQL`.
//!
//! Run with: `cargo test -p tidi-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Json;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use tidi_core::{Money, ProductId};
use tidi_integration_tests::{TestContext, database_url};
use tidi_web::config::TidiConfig;
use tidi_web::db::CatalogRepository;
use tidi_web::models::{CurrentUser, User, Workspace, session_keys};
use tidi_web::routes;
use tidi_web::services::TracingCodeDelivery;
use tidi_web::state::AppState;

async fn sign_in_as(session: Session, Json(user): Json<CurrentUser>) {
    session
        .insert(session_keys::CURRENT_USER, user)
        .await
        .unwrap();
}

fn app(ctx: &TestContext) -> Router {
    let config = TidiConfig {
        database_url: database_url(),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("x".repeat(64)),
        sign_in_code_ttl: chrono::Duration::minutes(10),
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = AppState::new(config, ctx.pool.clone(), Arc::new(TracingCodeDelivery));

    routes::routes()
        .route("/test/sign-in", post(sign_in_as))
        .with_state(state)
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

/// Router plus the session cookie it handed out.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    async fn signed_in(ctx: &TestContext, user: &User) -> Self {
        let mut browser = Self {
            app: app(ctx),
            cookie: None,
        };
        let current = CurrentUser {
            id: user.id,
            email: user.email.clone(),
        };
        let (status, _) = browser
            .send("POST", "/test/sign-in", Some(serde_json::to_value(current).unwrap()))
            .await;
        assert_eq!(status, StatusCode::OK);
        browser
    }

    async fn send(
        &mut self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

async fn create_product(ctx: &TestContext, workspace: &Workspace) -> ProductId {
    CatalogRepository::new(&ctx.pool)
        .create_product(
            workspace.id,
            "Inverter",
            Money::from_cents(250_000),
            Money::from_cents(180_000),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_toggle_picks_from_workspace_catalog() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;
    let product = create_product(&ctx, &workspace).await;
    let mut browser = Browser::signed_in(&ctx, &owner).await;

    let uri = format!("/api/proposals/products/toggle?workspace={}", workspace.slug);
    let (status, toggled) = browser
        .send("POST", &uri, Some(json!({ "id": product.as_i32() })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["items"][0]["item"]["description"], json!("Inverter"));
    assert_eq!(toggled["total_price"], json!("2500.00"));
    assert_eq!(toggled["total_profit"], json!("700.00"));

    let (_, current) = browser
        .send("GET", "/api/proposals/products/selection", None)
        .await;
    assert_eq!(current["items"][0]["item"]["id"], json!(product.as_i32()));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_toggle_product_of_other_workspace_is_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let mine = ctx.create_workspace(&owner).await;
    let other = ctx.create_workspace(&owner).await;
    let product = create_product(&ctx, &other).await;
    let mut browser = Browser::signed_in(&ctx, &owner).await;

    let uri = format!("/api/proposals/products/toggle?workspace={}", mine.slug);
    let (status, _) = browser
        .send("POST", &uri, Some(json!({ "id": product.as_i32() })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, current) = browser
        .send("GET", "/api/proposals/products/selection", None)
        .await;
    assert_eq!(current["items"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_toggle_in_someone_elses_workspace_is_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let stranger = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;
    let product = create_product(&ctx, &workspace).await;
    let mut browser = Browser::signed_in(&ctx, &stranger).await;

    let uri = format!("/api/proposals/products/toggle?workspace={}", workspace.id);
    let (status, _) = browser
        .send("POST", &uri, Some(json!({ "id": product.as_i32() })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
