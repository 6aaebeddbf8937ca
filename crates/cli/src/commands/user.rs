//! User management commands.
//!
//! ```bash
//! # Create a user who signs in with a one-time code
//! tidi-cli user create -e ana@example.com -n "Ana"
//!
//! # Create a user with a password
//! tidi-cli user create -e ana@example.com -n "Ana" --password 'correct horse'
//!
//! # Set or replace a password
//! tidi-cli user set-password -e ana@example.com --password 'correct horse'
//! ```

use thiserror::Error;

use tidi_core::{Email, EmailError, UserId};
use tidi_web::db::{RepositoryError, UserRepository};
use tidi_web::services::AuthError;
use tidi_web::services::auth::{hash_secret, validate_password};

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("No user with email: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Password(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn hashed_password(password: &str) -> Result<String, UserError> {
    validate_password(password)?;
    Ok(hash_secret(password)?)
}

/// Create a user. Returns the new user's ID.
///
/// # Errors
///
/// Returns `UserError` if the email is invalid or taken, the password is too
/// weak, or the database fails.
pub async fn create(
    email: &str,
    name: Option<&str>,
    password: Option<&str>,
) -> Result<UserId, UserError> {
    let email = Email::parse(email)?;
    let password_hash = password.map(hashed_password).transpose()?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.get_by_email(&email).await?.is_some() {
        return Err(UserError::UserExists(email.to_string()));
    }

    let user = users
        .create(&email, name, password_hash.as_deref())
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(user.id)
}

/// Set or replace a user's password.
///
/// # Errors
///
/// Returns `UserError` if the user does not exist, the password is too weak,
/// or the database fails.
pub async fn set_password(email: &str, password: &str) -> Result<(), UserError> {
    let email = Email::parse(email)?;
    let password_hash = hashed_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| UserError::UnknownUser(email.to_string()))?;

    users.set_password_hash(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password updated");
    Ok(())
}
