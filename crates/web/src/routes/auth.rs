//! Sign-in route handlers.
//!
//! Identity comes from an external provider; this app only needs the
//! provider's username (and email, when it has one) to establish the actor
//! for the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalActor, clear_current_actor, push_flash, set_current_actor};
use crate::models::{CurrentActor, Notice};

/// Longest accepted username.
const MAX_USERNAME_CHARS: usize = 64;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Message for an `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "username" => "Please enter a username.",
        "username_too_long" => "That username is too long.",
        "session" => "Could not start your session. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the sign-in page. Already signed-in actors go straight to tickets.
pub async fn login_page(
    OptionalActor(actor): OptionalActor,
    Query(query): Query<MessageQuery>,
) -> Response {
    if actor.is_some() {
        return Redirect::to("/tickets").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle sign-in form submission.
#[instrument(skip_all, fields(username = %form.username.trim()))]
pub async fn login(session: Session, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();
    if username.is_empty() {
        return Redirect::to("/auth/login?error=username").into_response();
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Redirect::to("/auth/login?error=username_too_long").into_response();
    }

    let actor = CurrentActor::new(username, form.email);

    // Fresh session ID on privilege change
    if let Err(e) = session.cycle_id().await {
        tracing::error!("Failed to cycle session id: {}", e);
        return Redirect::to("/auth/login?error=session").into_response();
    }
    if let Err(e) = set_current_actor(&session, &actor).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&actor.id, &actor.username, actor.email.as_deref());
    tracing::info!(user_id = %actor.id, "Signed in");

    push_flash(
        &session,
        &Notice::success("Signed in", format!("Welcome, {}.", actor.username)),
    )
    .await;

    Redirect::to("/tickets").into_response()
}

/// Sign out.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_actor(&session).await?;
    session.flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message("username"), "Please enter a username.");
        assert_eq!(error_message("anything"), "Sign-in failed. Please try again.");
    }
}
