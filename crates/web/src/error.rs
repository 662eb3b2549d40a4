//! HTTP error responses and Sentry reporting.
//!
//! Route handlers return `Result<T, AppError>`. A 5xx is reported to Sentry
//! and logged with the event id; the client only sees a generic message.
//!
//! Ticket creation does not go through here: its failures become
//! notifications (see [`crate::services::CreateTicketError`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::components::TransitionError;
use crate::db::RepositoryError;

/// Why a page or fragment could not be served.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("ticket store: {0}")]
    Database(#[from] RepositoryError),

    #[error("session store: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The list view was driven through a transition it does not allow.
    #[error("ticket view: {0}")]
    View(#[from] TransitionError),

    #[error("{0} does not exist")]
    NotFound(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Session(_) | Self::View(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text for the response body.
    fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) => self.to_string(),
            Self::Database(RepositoryError::NotFound) => "Ticket not found".to_owned(),
            Self::Database(RepositoryError::Conflict(_)) => {
                "That ticket was changed by someone else".to_owned()
            }
            Self::Database(_) | Self::Session(_) | Self::View(_) => {
                "Something went wrong on our side".to_owned()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

/// Attach the signed-in actor to Sentry events.
pub fn set_sentry_user(user_id: &impl ToString, username: &str, email: Option<&str>) {
    let user = sentry::User {
        id: Some(user_id.to_string()),
        username: Some(username.to_owned()),
        email: email.map(str::to_owned),
        ..Default::default()
    };
    sentry::configure_scope(|scope| scope.set_user(Some(user)));
}

/// Forget the actor after sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a user action as an info breadcrumb, with optional string data.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| ((*k).to_owned(), serde_json::Value::from(*v)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use supportdesk_core::TicketId;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_missing_things_are_404() {
        assert_eq!(
            status_of(AppError::NotFound("ticket 1".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_is_409() {
        assert_eq!(
            status_of(AppError::Database(RepositoryError::Conflict("dup".to_owned()))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_store_and_view_failures_are_500() {
        assert_eq!(
            status_of(AppError::Database(RepositoryError::Rejected("x".to_owned()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::View(TransitionError::UnknownTicket(
                TicketId::generate()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad enum in row 7".to_owned(),
        ));
        assert_eq!(err.public_message(), "Something went wrong on our side");
        assert!(err.to_string().contains("row 7"));
    }
}
