//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tidi_core::{Email, UserId};

/// An application user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    /// Set once the user has created their first workspace.
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
