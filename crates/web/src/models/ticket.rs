//! Ticket domain types.
//!
//! These are the validated records the store reads and writes, separate from
//! the form and template view types in `routes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supportdesk_core::{
    Email, ProductId, ReplyId, TicketCategory, TicketId, TicketStatus, UserId, UserRole,
    ValidTicket,
};

use super::CurrentActor;

/// A support ticket row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub product_id: Option<ProductId>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a brand-new ticket from a validated draft.
    ///
    /// Status is always `Open` and both timestamps are `now`.
    #[must_use]
    pub fn open(id: TicketId, user_id: UserId, draft: ValidTicket, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            product_id: draft.product_id,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A ticket joined with its product name and reply count, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub ticket: Ticket,
    pub product_name: Option<String>,
    pub reply_count: i64,
}

impl TicketSummary {
    #[must_use]
    pub const fn id(&self) -> TicketId {
        self.ticket.id
    }

    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        self.ticket.status
    }
}

/// A product customers can attach to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub available: bool,
}

/// Local, denormalized copy of an identity.
///
/// Written best-effort on ticket creation so listings can show who filed
/// what. The identity provider stays the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalUser {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: UserRole,
}

impl From<&CurrentActor> for LocalUser {
    fn from(actor: &CurrentActor) -> Self {
        Self {
            id: actor.id,
            username: actor.username.clone(),
            email: Email::or_fallback(actor.email.as_deref(), &actor.username),
            role: UserRole::default(),
        }
    }
}

/// A reply on a ticket. Read-only here; replies are authored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketReply {
    pub id: ReplyId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ticket_invariants() {
        let now = Utc::now();
        let ticket = Ticket::open(
            TicketId::generate(),
            UserId::for_username("ana"),
            ValidTicket {
                title: "Late delivery".to_owned(),
                description: "Order has not arrived".to_owned(),
                category: TicketCategory::Orders,
                product_id: None,
            },
            now,
        );

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.updated_at, now);
        assert_eq!(ticket.product_id, None);
    }

    #[test]
    fn test_local_user_defaults() {
        let actor = CurrentActor::new("ana", None);
        let user = LocalUser::from(&actor);

        assert_eq!(user.id, actor.id);
        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.email.as_str(), "ana@users.invalid");
    }

    #[test]
    fn test_local_user_keeps_real_email() {
        let actor = CurrentActor::new("ana", Some("Ana@Example.com".to_owned()));
        assert_eq!(LocalUser::from(&actor).email.as_str(), "ana@example.com");
    }
}
