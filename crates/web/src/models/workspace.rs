//! Workspace and address domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tidi_core::{AddressId, Slug, UserId, WorkspaceId};

/// A tenant business record owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub slug: Slug,
    pub owner_id: UserId,
    pub address_id: Option<AddressId>,
    pub logo: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Postal address attached to at most one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub cep: Option<String>,
    pub address: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
}

/// A workspace together with its address, for the settings screen.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceDetail {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub address: Option<Address>,
}
