//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::DeliveryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tidi_core::EmailError),

    /// Wrong password, unknown user, or no password set.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// One-time code is wrong, expired or already used.
    #[error("invalid or expired code")]
    InvalidCode,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The code could not be sent.
    #[error("code delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
