//! Authentication service.
//!
//! Two ways in from the sign-in screen:
//! - email + password, verified against an Argon2id hash;
//! - a one-time six digit code sent to the email address.
//!
//! Each submission is a single attempt. Failures are returned to the caller
//! to be shown to the user; nothing here retries.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;

use tidi_core::Email;

use crate::db::{SignInCodeRepository, UserRepository};
use crate::models::User;
use crate::services::CodeDelivery;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Number of digits in a one-time sign-in code.
const SIGN_IN_CODE_DIGITS: usize = 6;

/// Wrong guesses a code survives; the last one retires it.
pub const MAX_CODE_ATTEMPTS: i32 = 5;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    codes: SignInCodeRepository<'a>,
    delivery: &'a dyn CodeDelivery,
    code_ttl: Duration,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool, delivery: &'a dyn CodeDelivery, code_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            codes: SignInCodeRepository::new(pool),
            delivery,
            code_ttl,
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::InvalidCredentials` if the user is unknown, has no
    /// password, or the password does not match.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_secret(password, &password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        tracing::info!(user_id = %user.id, "password sign-in");
        Ok(user)
    }

    /// Issue a one-time code for `email` and hand it to the delivery channel.
    ///
    /// Unknown emails get no code but the call still succeeds, so the
    /// response does not reveal which addresses have accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed, and
    /// storage or delivery errors otherwise.
    pub async fn request_sign_in_code(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        if self.users.get_by_email(&email).await?.is_none() {
            tracing::info!(email = %email, "sign-in code requested for unknown email");
            return Ok(());
        }

        let code = generate_code();
        let code_hash = hash_secret(&code)?;
        let expires_at = Utc::now() + self.code_ttl;
        self.codes.issue(&email, &code_hash, expires_at).await?;
        self.delivery.deliver(&email, &code)?;

        Ok(())
    }

    /// Sign in with a one-time code. The code is consumed on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` if there is no live code for the
    /// email, the code does not match, or it was consumed concurrently.
    /// Every mismatch counts against the code, which is retired after
    /// [`MAX_CODE_ATTEMPTS`] of them.
    pub async fn sign_in_with_code(&self, email: &str, code: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let code = code.trim();

        let active = self
            .codes
            .get_active(&email)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if verify_secret(code, &active.code_hash).is_err() {
            let attempts = self
                .codes
                .record_failure(active.id, MAX_CODE_ATTEMPTS)
                .await?;
            if attempts.is_some_and(|n| n >= MAX_CODE_ATTEMPTS) {
                tracing::warn!(email = %email, "sign-in code retired after failed attempts");
            }
            return Err(AuthError::InvalidCode);
        }

        if !self.codes.consume(active.id).await? {
            return Err(AuthError::InvalidCode);
        }

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        tracing::info!(user_id = %user.id, "one-time code sign-in");
        Ok(user)
    }
}

/// Check a new password against the minimum requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password or code using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_secret(secret: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..SIGN_IN_CODE_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
