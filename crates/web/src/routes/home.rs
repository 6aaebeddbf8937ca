//! Root guard, onboarding and the workspace list page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use tidi_core::Slug;
use tidi_core::workspace::NewWorkspace;

use crate::error::{AppError, Result};
use crate::middleware::Requester;
use crate::models::Workspace;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OnboardingForm {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

/// Onboarding page template.
#[derive(Template, WebTemplate)]
#[template(path = "onboarding.html")]
pub struct OnboardingTemplate {
    pub error: Option<String>,
}

/// Workspace list template.
#[derive(Template, WebTemplate)]
#[template(path = "workspaces.html")]
pub struct WorkspacesTemplate {
    pub workspaces: Vec<Workspace>,
}

/// Where a signed-in user lands.
fn landing_for(is_onboarded: bool) -> &'static str {
    if is_onboarded { "/workspaces" } else { "/onboarding" }
}

/// Root guard. Anonymous visitors are sent to sign-in by `Requester`.
pub async fn index(Requester(user): Requester) -> Redirect {
    Redirect::to(landing_for(user.is_onboarded))
}

pub async fn onboarding_page(
    Requester(user): Requester,
    Query(query): Query<ErrorQuery>,
) -> Response {
    if user.is_onboarded {
        return Redirect::to("/workspaces").into_response();
    }
    OnboardingTemplate { error: query.error }.into_response()
}

/// Create the first workspace. Marks the user onboarded.
pub async fn onboarding(
    State(state): State<AppState>,
    Requester(user): Requester,
    Form(form): Form<OnboardingForm>,
) -> Response {
    let result = async {
        let slug = Slug::parse(&form.slug).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let data = NewWorkspace {
            name: form.name,
            slug,
            logo: None,
            email: None,
            phone: None,
        };
        state.workspaces().create_workspace(&user, data).await?;
        Ok::<_, AppError>(())
    }
    .await;

    match result {
        Ok(()) => Redirect::to("/workspaces").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.id, "Onboarding failed");
            let message = urlencoding::encode(&e.public_message()).into_owned();
            Redirect::to(&format!("/onboarding?error={message}")).into_response()
        }
    }
}

pub async fn workspaces_page(
    State(state): State<AppState>,
    Requester(user): Requester,
) -> Result<Response> {
    if !user.is_onboarded {
        return Ok(Redirect::to("/onboarding").into_response());
    }
    let workspaces = state.workspaces().get_user_workspaces(&user).await?;
    Ok(WorkspacesTemplate { workspaces }.into_response())
}
