//! Integration tests for Tidi.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database; migrations are applied automatically
//! export TIDI_TEST_DATABASE_URL=postgres://localhost/tidi_test
//! cargo test -p tidi-integration-tests -- --ignored
//!
//! # HTTP tests additionally need a running server
//! export TIDI_TEST_BASE_URL=http://localhost:3000
//! ```
//!
//! Every test creates its own users and workspaces with random emails and
//! slugs, so tests can share one database and run in parallel.

use std::sync::Mutex;

use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use tidi_core::workspace::NewWorkspace;
use tidi_core::{Email, Slug};
use tidi_web::db::{MIGRATOR, UserRepository, WorkspaceRepository, create_pool};
use tidi_web::models::{User, Workspace};
use tidi_web::services::{CodeDelivery, DeliveryError};

/// Database URL for tests.
#[must_use]
pub fn database_url() -> SecretString {
    std::env::var("TIDI_TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/tidi_test".to_string())
        .into()
}

/// Base URL of a running `tidi-web` for HTTP tests.
#[must_use]
pub fn base_url() -> String {
    std::env::var("TIDI_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Short random suffix for unique emails and slugs.
#[must_use]
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Shared handles for database-backed tests.
pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    /// Connect and bring the schema up to date.
    ///
    /// # Panics
    ///
    /// Panics if the database is unreachable or a migration fails.
    pub async fn new() -> Self {
        let pool = create_pool(&database_url())
            .await
            .expect("Failed to connect to test database");
        MIGRATOR.run(&pool).await.expect("Failed to run migrations");
        Self { pool }
    }

    /// Create a user with a random email.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_user(&self) -> User {
        let email = Email::parse(&format!("user-{}@example.com", unique_suffix()))
            .expect("generated email is valid");
        UserRepository::new(&self.pool)
            .create(&email, Some("Test User"), None)
            .await
            .expect("Failed to create user")
    }

    /// Create a workspace with a random slug owned by `owner`.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_workspace(&self, owner: &User) -> Workspace {
        let data = NewWorkspace {
            name: "Test Workspace".to_string(),
            slug: Slug::parse(&format!("ws-{}", unique_suffix())).expect("generated slug is valid"),
            logo: None,
            email: None,
            phone: None,
        };
        WorkspaceRepository::new(&self.pool)
            .create(owner.id, &data)
            .await
            .expect("Failed to create workspace")
    }

    /// Number of address rows with this postal code.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn addresses_with_cep(&self, cep: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tidi.address WHERE cep = $1")
            .bind(cep)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count addresses")
    }
}

/// Code delivery that keeps every code it is handed.
#[derive(Debug, Default)]
pub struct CapturedCodes {
    codes: Mutex<Vec<(Email, String)>>,
}

impl CapturedCodes {
    /// Most recent code sent to `email`.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn last_for(&self, email: &Email) -> Option<String> {
        self.codes
            .lock()
            .expect("captured codes mutex poisoned")
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

impl CodeDelivery for CapturedCodes {
    fn deliver(&self, email: &Email, code: &str) -> Result<(), DeliveryError> {
        self.codes
            .lock()
            .map_err(|e| DeliveryError(e.to_string()))?
            .push((email.clone(), code.to_string()));
        Ok(())
    }
}
