//! Actor extractors and session helpers.
//!
//! The signed-in actor and one-shot flash notices both live in the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentActor, Notice, session_keys};

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires a signed-in actor.
///
/// Page requests without one are redirected to the login page. HTMX requests
/// get `401` with `HX-Redirect`, so the browser navigates to the login page
/// instead of swapping an error into the fragment target.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireActor(actor): RequireActor) -> impl IntoResponse {
///     format!("Hello, {}!", actor.username)
/// }
/// ```
pub struct RequireActor(pub CurrentActor);

/// Why [`RequireActor`] refused a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (full page loads).
    RedirectToLogin,
    /// `401` with an `HX-Redirect` header (HTMX requests).
    HxRedirectToLogin,
    /// Bare `401` when no session layer is installed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HxRedirectToLogin => (
                StatusCode::UNAUTHORIZED,
                AppendHeaders([("HX-Redirect", LOGIN_PATH)]),
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(parts: &Parts) -> bool {
    parts.headers.contains_key("HX-Request")
}

impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let actor: CurrentActor = session
            .get(session_keys::CURRENT_ACTOR)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if is_htmx(parts) {
                    AuthRejection::HxRedirectToLogin
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(actor))
    }
}

/// Extractor that optionally gets the signed-in actor.
///
/// Never rejects. Ticket creation uses this so a missing actor is reported
/// as a notification rather than a redirect.
pub struct OptionalActor(pub Option<CurrentActor>);

impl<S> FromRequestParts<S> for OptionalActor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentActor>(session_keys::CURRENT_ACTOR)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(actor))
    }
}

/// Store the signed-in actor in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_actor(
    session: &Session,
    actor: &CurrentActor,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ACTOR, actor).await
}

/// Remove the signed-in actor from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_actor(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentActor>(session_keys::CURRENT_ACTOR)
        .await?;
    Ok(())
}

/// Queue a notice for the next full page render. Failures are logged.
pub async fn push_flash(session: &Session, notice: &Notice) {
    if let Err(e) = session.insert(session_keys::FLASH, notice).await {
        tracing::warn!(error = %e, "Failed to store flash notice");
    }
}

/// Take the queued notice, if any. It is removed from the session.
pub async fn take_flash(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(session_keys::FLASH)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to read flash notice"))
        .ok()
        .flatten()
}
