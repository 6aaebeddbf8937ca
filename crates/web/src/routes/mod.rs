//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Root guard (sign-in / onboarding / workspaces)
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//! GET  /onboarding              - Create the first workspace
//! POST /onboarding
//! GET  /workspaces              - Workspace list page
//!
//! # Sign-in
//! GET  /auth/sign-in            - Password step
//! POST /auth/sign-in            - Password submission
//! POST /auth/sign-in/unique-code - Send a code, go to the code step
//! GET  /auth/sign-in/code       - Code step
//! POST /auth/sign-in/code       - Code submission
//! POST /auth/sign-out
//! POST /api/magic-generate      - Send a code (JSON)
//!
//! # Workspace API
//! GET  /api/workspaces/verify-slug
//! GET  /api/workspaces          POST /api/workspaces
//! GET  /api/workspaces/{identifier}
//! PUT  /api/workspaces/{identifier}
//! GET  /api/workspaces/{identifier}/products   POST (create)
//! GET  /api/workspaces/{identifier}/services   POST (create)
//!
//! # Proposal pickers ({kind} = products | services)
//! GET  /api/proposals/{kind}/selection
//! PUT  /api/proposals/{kind}/selection          - Seed from a parent list
//! POST /api/proposals/{kind}/toggle?workspace=  - {id}
//! POST /api/proposals/{kind}/quantity           - {id, quantity}
//! POST /api/proposals/{kind}/remove             - {id}
//! ```

pub mod auth;
pub mod catalog;
pub mod home;
pub mod proposals;
pub mod workspaces;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the sign-in routes router.
pub fn auth_routes() -> Router<AppState> {
    let attempts = Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-in/unique-code", post(auth::request_unique_code))
        .route("/sign-in/code", post(auth::sign_in_with_code))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/sign-in", get(auth::sign_in_page))
        .route("/sign-in/code", get(auth::code_page))
        .route("/sign-out", post(auth::sign_out))
        .merge(attempts)
}

/// Create the workspace API router.
pub fn workspace_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(workspaces::list).post(workspaces::create))
        .route("/verify-slug", get(workspaces::verify_slug))
        .route(
            "/{identifier}",
            get(workspaces::show).put(workspaces::update),
        )
        .route(
            "/{identifier}/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/{identifier}/services",
            get(catalog::list_services).post(catalog::create_service),
        )
}

/// Create the proposal picker router.
pub fn proposal_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/selection",
            get(proposals::products_selection).put(proposals::seed_products),
        )
        .route("/products/toggle", post(proposals::toggle_product))
        .route("/products/quantity", post(proposals::set_product_quantity))
        .route("/products/remove", post(proposals::remove_product))
        .route(
            "/services/selection",
            get(proposals::services_selection).put(proposals::seed_services),
        )
        .route("/services/toggle", post(proposals::toggle_service))
        .route("/services/quantity", post(proposals::set_service_quantity))
        .route("/services/remove", post(proposals::remove_service))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route(
            "/onboarding",
            get(home::onboarding_page).post(home::onboarding),
        )
        .route("/workspaces", get(home::workspaces_page))
        .nest("/auth", auth_routes())
        .route(
            "/api/magic-generate",
            post(auth::magic_generate).layer(auth_rate_limiter()),
        )
        .nest("/api/workspaces", workspace_routes())
        .nest("/api/proposals", proposal_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    use crate::config::TidiConfig;
    use crate::services::TracingCodeDelivery;
    use crate::state::AppState;

    /// State over a pool that never connects; fine for requests that are
    /// answered before touching the database.
    pub fn state() -> AppState {
        let config = TidiConfig {
            database_url: SecretString::from("postgres://localhost/tidi_unused".to_string()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            sign_in_code_ttl: chrono::Duration::minutes(10),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tidi_unused")
            .unwrap();
        AppState::new(config, pool, Arc::new(TracingCodeDelivery))
    }
}
