//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::TidiConfig;
use crate::services::{AuthService, CodeDelivery, WorkspaceService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: TidiConfig,
    pool: PgPool,
    delivery: Arc<dyn CodeDelivery>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: TidiConfig, pool: PgPool, delivery: Arc<dyn CodeDelivery>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                delivery,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &TidiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Authentication service bound to this state's pool and code channel.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.pool,
            self.inner.delivery.as_ref(),
            self.inner.config.sign_in_code_ttl,
        )
    }

    /// Workspace service bound to this state's pool.
    #[must_use]
    pub fn workspaces(&self) -> WorkspaceService<'_> {
        WorkspaceService::new(&self.inner.pool)
    }
}
