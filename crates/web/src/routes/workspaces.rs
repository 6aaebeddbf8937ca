//! Workspace JSON API.
//!
//! ```text
//! GET  /api/workspaces/verify-slug?slug=  - null | {"status": bool}
//! GET  /api/workspaces                    - workspaces of the requester
//! POST /api/workspaces                    - create
//! GET  /api/workspaces/{identifier}       - one workspace with its address
//! PUT  /api/workspaces/{identifier}       - update address and contact
//! ```
//!
//! `{identifier}` is a numeric id or a slug.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use tidi_core::WorkspaceRef;
use tidi_core::workspace::{NewWorkspace, SlugStatus, UpdateWorkspaceInput};

use crate::error::Result;
use crate::middleware::Requester;
use crate::models::{Workspace, WorkspaceDetail};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifySlugQuery {
    pub slug: Option<String>,
}

/// Whether a slug is still free. Public: used while filling in onboarding.
pub async fn verify_slug(
    State(state): State<AppState>,
    Query(query): Query<VerifySlugQuery>,
) -> Result<Json<Option<SlugStatus>>> {
    let status = state.workspaces().verify_slug(query.slug.as_deref()).await?;
    Ok(Json(status))
}

pub async fn list(
    State(state): State<AppState>,
    Requester(user): Requester,
) -> Result<Json<Vec<Workspace>>> {
    let workspaces = state.workspaces().get_user_workspaces(&user).await?;
    Ok(Json(workspaces))
}

pub async fn create(
    State(state): State<AppState>,
    Requester(user): Requester,
    Json(data): Json<NewWorkspace>,
) -> Result<(StatusCode, Json<Workspace>)> {
    let workspace = state.workspaces().create_workspace(&user, data).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub async fn show(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
) -> Result<Json<WorkspaceDetail>> {
    let identifier = WorkspaceRef::parse(&identifier);
    let detail = state
        .workspaces()
        .get_workspace_detail(&user, &identifier)
        .await?;
    Ok(Json(detail))
}

/// Update address and contact fields in one transaction.
pub async fn update(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
    Json(data): Json<UpdateWorkspaceInput>,
) -> Result<Json<Workspace>> {
    let identifier = WorkspaceRef::parse(&identifier);
    let workspace = state
        .workspaces()
        .update_workspace(&user, &identifier, &data)
        .await?;
    Ok(Json(workspace))
}
