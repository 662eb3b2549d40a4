//! Ticket repository: the request layer in front of the backend data store.
//!
//! # Database: `desk` schema
//!
//! ## Tables
//!
//! - `products` - Products a ticket may refer to (read-only here)
//! - `tickets` - Support tickets
//! - `users` - Denormalized identity cache, upserted on ticket creation
//! - `ticket_replies` - Replies, counted per ticket
//!
//! Sessions live in the `tower_sessions` schema managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p supportdesk-cli -- migrate
//! ```
//!
//! # Implementations
//!
//! [`TicketStore`] is implemented by [`PgTicketStore`] for `PostgreSQL` and by
//! [`InMemoryTicketStore`], which backs tests and counts every request.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use supportdesk_core::{TicketId, TicketStatus};

use crate::models::{LocalUser, Product, Ticket, TicketReply, TicketSummary};

pub use memory::{InMemoryTicketStore, StoreOp};
pub use postgres::PgTicketStore;

/// Migrations for the `desk` schema, embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate ticket ID).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store refused the request (used by the in-memory store).
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl RepositoryError {
    /// Message suitable for showing to the user.
    ///
    /// Database errors surface the backend's own message (not connection
    /// strings or driver internals); everything else uses `Display`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => db_err.message().to_owned(),
            Self::Database(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                "the ticket database is unavailable".to_owned()
            }
            Self::Database(_) => "the ticket database request failed".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Create/read/update requests against the backend data store.
///
/// Every method is exactly one logical request: no retries, no caching.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Products with `available = true`, ordered by name.
    async fn list_available_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert one ticket row and return its ID.
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<TicketId, RepositoryError>;

    /// Insert the user row unless one with the same ID exists.
    async fn upsert_user(&self, user: &LocalUser) -> Result<(), RepositoryError>;

    /// All tickets with product name and reply count, newest first.
    async fn list_tickets(&self) -> Result<Vec<TicketSummary>, RepositoryError>;

    /// One ticket with product name and reply count.
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    async fn get_ticket(&self, ticket_id: TicketId) -> Result<TicketSummary, RepositoryError>;

    /// Replies on one ticket, oldest first.
    async fn list_replies(&self, ticket_id: TicketId) -> Result<Vec<TicketReply>, RepositoryError>;

    /// Set a ticket's status and bump `updated_at`.
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_driver_details() {
        let err = RepositoryError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.user_message(), "the ticket database is unavailable");

        let err = RepositoryError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.user_message(), "the ticket database request failed");
    }

    #[test]
    fn test_user_message_passes_through_domain_errors() {
        let err = RepositoryError::Rejected("insert refused".to_owned());
        assert_eq!(err.user_message(), "request rejected: insert refused");
    }
}
