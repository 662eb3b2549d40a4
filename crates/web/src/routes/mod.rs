//! HTTP route handlers for SupportDesk.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /tickets
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store reachable)
//!
//! # Auth
//! GET  /auth/login             - Sign-in page
//! POST /auth/login             - Sign in
//! POST /auth/logout            - Sign out
//!
//! # Tickets (requires auth)
//! GET  /tickets                - List page
//! GET  /tickets/list           - List fragment (HTMX, re-fetched on tickets-changed)
//! GET  /tickets/new            - Creation dialog fragment (HTMX)
//! POST /tickets                - Submit creation dialog (HTMX)
//! GET  /tickets/{id}           - Detail page
//! POST /tickets/{id}/status    - Toggle open/closed
//! ```

pub mod auth;
pub mod htmx;
pub mod tickets;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the ticket routes router.
pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tickets::index).post(tickets::create))
        .route("/list", get(tickets::list_fragment))
        .route("/new", get(tickets::new_dialog))
        .route("/{id}", get(tickets::detail))
        .route("/{id}/status", post(tickets::toggle_status))
}

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/tickets") }))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/tickets", ticket_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the ticket store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
