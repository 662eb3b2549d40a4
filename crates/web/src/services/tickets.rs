//! Ticket creation workflow.
//!
//! Order of checks matters: the draft is validated and the actor is
//! required before anything is sent to the store, so a rejected submission
//! never costs a request.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use supportdesk_core::{TicketDraft, TicketId, ValidationError};

use crate::db::{RepositoryError, TicketStore};
use crate::models::{CurrentActor, LocalUser, Notice, Ticket};

/// Why a ticket could not be created.
#[derive(Debug, Error)]
pub enum CreateTicketError {
    /// The draft is missing required fields or is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Nobody is signed in.
    #[error("you must be signed in to create a ticket")]
    Unauthenticated,

    /// The store rejected the insert.
    #[error("could not save ticket: {}", .0.user_message())]
    Store(#[from] RepositoryError),
}

impl CreateTicketError {
    /// Notification describing this failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(err) => {
                Notice::error("Missing information", capitalize(&err.to_string()))
            }
            Self::Unauthenticated => {
                Notice::error("Not signed in", "Please sign in to create a ticket.")
            }
            Self::Store(err) => Notice::error("Could not create ticket", err.user_message()),
        }
    }

    /// Whether the store was contacted at all.
    #[must_use]
    pub const fn reached_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Success notification for a new ticket.
#[must_use]
pub fn created_notice(ticket: &Ticket) -> Notice {
    Notice::success(
        "Ticket created",
        format!("\"{}\" has been submitted. We'll be in touch soon.", ticket.title),
    )
}

/// Creates tickets against a [`TicketStore`].
pub struct TicketCreationWorkflow<'a> {
    store: &'a dyn TicketStore,
}

impl<'a> TicketCreationWorkflow<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn TicketStore) -> Self {
        Self { store }
    }

    /// Validate and persist a new ticket for `actor`.
    ///
    /// On success exactly one insert has been issued, followed by a
    /// best-effort user upsert (see [`Self::remember_user`]).
    ///
    /// # Errors
    ///
    /// - [`CreateTicketError::Validation`] if the draft is incomplete (no request made)
    /// - [`CreateTicketError::Unauthenticated`] if `actor` is `None` (no request made)
    /// - [`CreateTicketError::Store`] if the insert fails (user upsert skipped)
    #[instrument(skip_all, fields(actor = ?actor.map(|a| &a.username)))]
    pub async fn submit(
        &self,
        actor: Option<&CurrentActor>,
        draft: &TicketDraft,
        now: DateTime<Utc>,
    ) -> Result<Ticket, CreateTicketError> {
        let valid = draft.validate()?;
        let actor = actor.ok_or(CreateTicketError::Unauthenticated)?;

        let ticket = Ticket::open(TicketId::generate(), actor.id, valid, now);

        let id = self
            .store
            .insert_ticket(&ticket)
            .await
            .inspect_err(|e| {
                tracing::error!(ticket_id = %ticket.id, error = %e, "Failed to insert ticket");
            })?;
        if id != ticket.id {
            tracing::warn!(expected = %ticket.id, returned = %id, "Store returned a different ticket id");
        }
        tracing::info!(ticket_id = %ticket.id, category = %ticket.category, "Ticket created");

        self.remember_user(actor).await;

        Ok(ticket)
    }

    /// Cache the actor in the local `users` table. Fire-and-forget.
    ///
    /// Contract: never returns an error and never affects the caller's
    /// outcome. Existing rows are left untouched; failures are logged at
    /// `warn` and dropped.
    pub async fn remember_user(&self, actor: &CurrentActor) {
        let user = LocalUser::from(actor);
        if let Err(e) = self.store.upsert_user(&user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Ignoring failed user upsert");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supportdesk_core::{ProductChoice, TicketCategory, TicketStatus};

    use super::*;
    use crate::db::{InMemoryTicketStore, StoreOp};

    fn draft() -> TicketDraft {
        TicketDraft {
            title: "Late delivery".to_owned(),
            description: "Order has not arrived".to_owned(),
            category: Some(TicketCategory::Orders),
            product: ProductChoice::NONE,
        }
    }

    fn actor() -> CurrentActor {
        CurrentActor::new("ana", Some("ana@example.com".to_owned()))
    }

    #[tokio::test]
    async fn test_incomplete_draft_makes_no_request() {
        let store = InMemoryTicketStore::new();
        let workflow = TicketCreationWorkflow::new(&store);

        let mutations: [fn(&mut TicketDraft); 3] = [
            |d| d.title.clear(),
            |d| d.description = "  ".to_owned(),
            |d| d.category = None,
        ];
        for mutate in mutations {
            let mut d = draft();
            mutate(&mut d);
            let err = workflow
                .submit(Some(&actor()), &d, Utc::now())
                .await
                .unwrap_err();
            assert!(matches!(err, CreateTicketError::Validation(_)));
            assert!(err.notice().is_error());
        }

        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_actor_makes_no_request() {
        let store = InMemoryTicketStore::new();
        let workflow = TicketCreationWorkflow::new(&store);

        let err = workflow.submit(None, &draft(), Utc::now()).await.unwrap_err();

        assert!(matches!(err, CreateTicketError::Unauthenticated));
        assert!(!err.reached_store());
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_validation_is_reported_before_authentication() {
        let store = InMemoryTicketStore::new();
        let workflow = TicketCreationWorkflow::new(&store);

        let err = workflow
            .submit(None, &TicketDraft::default(), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CreateTicketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_success_inserts_once_and_caches_user() {
        let store = InMemoryTicketStore::new();
        let workflow = TicketCreationWorkflow::new(&store);
        let now = Utc::now();
        let actor = actor();

        let ticket = workflow.submit(Some(&actor), &draft(), now).await.unwrap();

        assert_eq!(store.calls(StoreOp::InsertTicket), 1);
        assert_eq!(store.calls(StoreOp::UpsertUser), 1);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.category, TicketCategory::Orders);
        assert_eq!(ticket.product_id, None);
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.updated_at, now);
        assert_eq!(ticket.user_id, actor.id);
        assert_eq!(store.ticket(ticket.id).await.unwrap(), ticket);
        assert_eq!(store.user(actor.id).await.unwrap().username, "ana");
    }

    #[tokio::test]
    async fn test_failed_insert_skips_user_upsert() {
        let store = InMemoryTicketStore::new();
        store.fail(StoreOp::InsertTicket);
        let workflow = TicketCreationWorkflow::new(&store);

        let err = workflow
            .submit(Some(&actor()), &draft(), Utc::now())
            .await
            .unwrap_err();

        assert!(err.reached_store());
        assert_eq!(store.calls(StoreOp::InsertTicket), 1);
        assert_eq!(store.calls(StoreOp::UpsertUser), 0);
        let notice = err.notice();
        assert_eq!(notice.title, "Could not create ticket");
        assert!(notice.description.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_failed_user_upsert_is_swallowed() {
        let store = InMemoryTicketStore::new();
        store.fail(StoreOp::UpsertUser);
        let workflow = TicketCreationWorkflow::new(&store);

        let ticket = workflow
            .submit(Some(&actor()), &draft(), Utc::now())
            .await
            .unwrap();

        assert!(store.ticket(ticket.id).await.is_some());
        assert_eq!(store.calls(StoreOp::UpsertUser), 1);
    }

    #[test]
    fn test_validation_notice_text() {
        let err = CreateTicketError::from(ValidationError::MissingFields(vec![
            supportdesk_core::TicketField::Title,
        ]));
        let notice = err.notice();
        assert_eq!(notice.title, "Missing information");
        assert_eq!(
            notice.description,
            "Please fill in all required fields: title"
        );
    }
}
