//! Sign-in route handlers.
//!
//! One screen, two ways in: password, or a one-time code sent by email.
//! Failures redirect back to the screen with an `error` message, which the
//! template shows as a toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{SignInStep, User};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Password sign-in form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub email: String,
    pub password: String,
}

/// One-time code request.
#[derive(Debug, Deserialize)]
pub struct CodeRequestForm {
    pub email: String,
}

/// One-time code sign-in form data.
#[derive(Debug, Deserialize)]
pub struct CodeForm {
    pub email: String,
    pub code: String,
}

/// Query parameters carried between sign-in steps.
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    pub email: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub step: SignInStep,
    pub email: String,
    pub error: Option<String>,
}

fn sign_in_redirect(path: &str, email: &str, error: Option<&AppError>) -> Response {
    let mut location = format!("{path}?email={}", urlencoding::encode(email.trim()));
    if let Some(error) = error {
        location.push_str("&error=");
        location.push_str(&urlencoding::encode(&error.public_message()));
    }
    Redirect::to(&location).into_response()
}

async fn start_session(session: &Session, user: &User) -> Result<Redirect> {
    set_current_user(session, user).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Password
// =============================================================================

/// Display the sign-in page.
pub async fn sign_in_page(Query(query): Query<SignInQuery>) -> impl IntoResponse {
    SignInTemplate {
        step: SignInStep::Password,
        email: query.email.unwrap_or_default(),
        error: query.error,
    }
}

/// Handle password submission.
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Response {
    let result = match state.auth().login_with_password(&form.email, &form.password).await {
        Ok(user) => start_session(&session, &user).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(redirect) => redirect.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Password sign-in failed");
            sign_in_redirect("/auth/sign-in", &form.email, Some(&e))
        }
    }
}

// =============================================================================
// One-Time Code
// =============================================================================

/// Issue a code from the password screen and move to the code step.
pub async fn request_unique_code(
    State(state): State<AppState>,
    Form(form): Form<CodeRequestForm>,
) -> Response {
    match state.auth().request_sign_in_code(&form.email).await {
        Ok(()) => sign_in_redirect("/auth/sign-in/code", &form.email, None),
        Err(e) => {
            let e = AppError::from(e);
            tracing::warn!(error = %e, "Sign-in code request failed");
            sign_in_redirect("/auth/sign-in", &form.email, Some(&e))
        }
    }
}

/// Display the code step.
pub async fn code_page(Query(query): Query<SignInQuery>) -> impl IntoResponse {
    SignInTemplate {
        step: SignInStep::UseUniqueCodeFromPassword,
        email: query.email.unwrap_or_default(),
        error: query.error,
    }
}

/// Handle code submission. The code is consumed on success.
pub async fn sign_in_with_code(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CodeForm>,
) -> Response {
    let result = match state.auth().sign_in_with_code(&form.email, &form.code).await {
        Ok(user) => start_session(&session, &user).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(redirect) => redirect.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Code sign-in failed");
            sign_in_redirect("/auth/sign-in/code", &form.email, Some(&e))
        }
    }
}

/// JSON variant of the code request used by scripts on the sign-in page.
pub async fn magic_generate(
    State(state): State<AppState>,
    Json(body): Json<CodeRequestForm>,
) -> Result<StatusCode> {
    state.auth().request_sign_in_code(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sign-Out
// =============================================================================

pub async fn sign_out(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/auth/sign-in"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthError;

    #[test]
    fn test_sign_in_redirect_carries_error() {
        let error = AppError::from(AuthError::InvalidCredentials);
        let response = sign_in_redirect("/auth/sign-in", " ana@example.com ", Some(&error));
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        assert_eq!(
            location,
            "/auth/sign-in?email=ana%40example.com&error=Invalid%20email%20or%20password"
        );
    }

    #[test]
    fn test_server_error_message_is_generic() {
        let error = AppError::Internal("pool timed out".to_string());
        let response = sign_in_redirect("/auth/sign-in", "a@b.co", Some(&error));
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        assert!(location.contains("There%20was%20a%20problem"));
        assert!(!location.contains("pool"));
    }

    #[test]
    fn test_password_step_renders_password_form() {
        let html = SignInTemplate {
            step: SignInStep::Password,
            email: "ana@example.com".to_string(),
            error: None,
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains(r#"action="/auth/sign-in""#));
        assert!(html.contains(r#"action="/auth/sign-in/unique-code""#));
        assert!(!html.contains("Oh no! Something went wrong."));
    }

    #[test]
    fn test_code_step_renders_toast() {
        let html = SignInTemplate {
            step: SignInStep::UseUniqueCodeFromPassword,
            email: "ana@example.com".to_string(),
            error: Some("Invalid or expired code".to_string()),
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains(r#"action="/auth/sign-in/code""#));
        assert!(html.contains("Oh no! Something went wrong."));
        assert!(html.contains("Invalid or expired code"));
    }
}
