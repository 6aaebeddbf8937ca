//! Workspace record manager.
//!
//! Every operation acts on behalf of an already resolved requester; see
//! `middleware::auth::Requester` for how the requester is resolved from the
//! session.

use sqlx::PgPool;
use thiserror::Error;

use tidi_core::WorkspaceRef;
use tidi_core::workspace::{
    AddressWrite, NewWorkspace, NewWorkspaceError, SlugStatus, UpdateWorkspaceInput,
};

use crate::db::{RepositoryError, WorkspaceRepository};
use crate::models::{User, Workspace, WorkspaceDetail};

/// Errors from workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// No workspace matches the identifier (for this requester).
    #[error("Workspace doesn't exist")]
    NotFound,

    /// The slug is already used by another workspace.
    #[error("slug already in use")]
    SlugTaken,

    /// The payload failed validation.
    #[error(transparent)]
    Invalid(#[from] NewWorkspaceError),

    /// Repository/database error.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for WorkspaceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => Self::SlugTaken,
            other => Self::Repository(other),
        }
    }
}

/// Workspace service.
pub struct WorkspaceService<'a> {
    workspaces: WorkspaceRepository<'a>,
}

impl<'a> WorkspaceService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            workspaces: WorkspaceRepository::new(pool),
        }
    }

    /// Report whether `slug` is free. `None` when no slug was given.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Repository` if the lookup fails.
    pub async fn verify_slug(
        &self,
        slug: Option<&str>,
    ) -> Result<Option<SlugStatus>, WorkspaceError> {
        let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let taken = self.workspaces.slug_exists(slug).await.inspect_err(|e| {
            tracing::error!(error = %e, slug, "Error fetching workspace");
        })?;

        Ok(Some(SlugStatus { status: !taken }))
    }

    /// Create a workspace owned by `requester`.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Invalid` if the name is blank.
    /// Returns `WorkspaceError::SlugTaken` if the slug is in use.
    pub async fn create_workspace(
        &self,
        requester: &User,
        data: NewWorkspace,
    ) -> Result<Workspace, WorkspaceError> {
        let data = data.normalized()?;
        let workspace = self
            .workspaces
            .create(requester.id, &data)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, owner = %requester.id, "Error creating workspace");
            })?;

        tracing::info!(workspace_id = %workspace.id, slug = %workspace.slug, "workspace created");
        Ok(workspace)
    }

    /// Update the address and contact fields of a workspace.
    ///
    /// Runs as one transaction: the address is updated in place when the
    /// workspace already has one, created and linked otherwise.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::NotFound` before any write if the workspace
    /// does not exist or belongs to someone else.
    pub async fn update_workspace(
        &self,
        requester: &User,
        identifier: &WorkspaceRef,
        data: &UpdateWorkspaceInput,
    ) -> Result<Workspace, WorkspaceError> {
        let (address, contact) = data.normalize();

        let (workspace, write) = self
            .workspaces
            .update_with_address(requester.id, identifier, &address, &contact)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, workspace = %identifier, "Error updating workspace");
            })?;

        match write {
            AddressWrite::CreateAndLink => tracing::info!(
                workspace_id = %workspace.id,
                address_id = ?workspace.address_id,
                "workspace address created"
            ),
            AddressWrite::UpdateExisting(address_id) => tracing::debug!(
                workspace_id = %workspace.id,
                %address_id,
                "workspace address updated"
            ),
        }

        Ok(workspace)
    }

    /// All workspaces owned by `requester`.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Repository` if the query fails.
    pub async fn get_user_workspaces(
        &self,
        requester: &User,
    ) -> Result<Vec<Workspace>, WorkspaceError> {
        let workspaces = self
            .workspaces
            .list_by_owner(requester.id)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, owner = %requester.id, "Error listing workspaces");
            })?;

        Ok(workspaces)
    }

    /// One workspace of `requester`, without its address.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::NotFound` if it does not exist for `requester`.
    pub async fn get_workspace(
        &self,
        requester: &User,
        identifier: &WorkspaceRef,
    ) -> Result<Workspace, WorkspaceError> {
        self.workspaces
            .find_owned(requester.id, identifier)
            .await?
            .ok_or(WorkspaceError::NotFound)
    }

    /// One workspace of `requester` with its address.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::NotFound` if it does not exist for `requester`.
    pub async fn get_workspace_detail(
        &self,
        requester: &User,
        identifier: &WorkspaceRef,
    ) -> Result<WorkspaceDetail, WorkspaceError> {
        let workspace = self.get_workspace(requester, identifier).await?;
        let address = match workspace.address_id {
            Some(id) => self.workspaces.get_address(id).await?,
            None => None,
        };

        Ok(WorkspaceDetail { workspace, address })
    }
}
