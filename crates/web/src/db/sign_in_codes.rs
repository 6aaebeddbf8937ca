//! One-time sign-in code repository.
//!
//! Only argon2 hashes of the codes are stored. Issuing a code retires every
//! earlier unused code for the same email, so at most one is live. A code is
//! also retired after too many wrong guesses.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tidi_core::{Email, SignInCodeId};

use super::RepositoryError;

/// A live (unused, unexpired) code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveSignInCode {
    pub id: SignInCodeId,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Repository for one-time sign-in codes.
pub struct SignInCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SignInCodeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code hash for `email`, retiring older ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn issue(
        &self,
        email: &Email,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<SignInCodeId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE tidi.sign_in_code SET used_at = NOW() WHERE email = $1 AND used_at IS NULL",
        )
        .bind(email.as_str())
        .execute(&mut *tx)
        .await?;

        let id = sqlx::query_scalar::<_, SignInCodeId>(
            r"
            INSERT INTO tidi.sign_in_code (email, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// The live code for `email`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(
        &self,
        email: &Email,
    ) -> Result<Option<ActiveSignInCode>, RepositoryError> {
        let row = sqlx::query_as::<_, ActiveSignInCode>(
            r"
            SELECT id, code_hash, expires_at
            FROM tidi.sign_in_code
            WHERE email = $1 AND used_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Count a wrong guess against a live code, retiring it once
    /// `max_attempts` is reached. Returns the new count, or `None` if the code
    /// was no longer live.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_failure(
        &self,
        id: SignInCodeId,
        max_attempts: i32,
    ) -> Result<Option<i32>, RepositoryError> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE tidi.sign_in_code
            SET failed_attempts = failed_attempts + 1,
                used_at = CASE
                    WHEN failed_attempts + 1 >= $2 THEN NOW()
                    ELSE used_at
                END
            WHERE id = $1 AND used_at IS NULL
            RETURNING failed_attempts
            ",
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(self.pool)
        .await?;

        Ok(attempts)
    }

    /// Mark a code used. Returns `false` if it was already consumed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(&self, id: SignInCodeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE tidi.sign_in_code SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
