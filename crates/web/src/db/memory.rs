//! In-memory implementation of [`TicketStore`].
//!
//! Used by tests and local demos. Besides holding data it records how many
//! requests of each kind were made and can be told to reject a kind of
//! request, which is how the workflow's "no request was made" and "insert
//! failed" paths are exercised.
//!
//! # Thread Safety
//!
//! Data sits behind a `tokio::sync::Mutex`; counters and failure switches are
//! a separate `std::sync::Mutex` so they can be read from sync test code.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex as SyncMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use supportdesk_core::{TicketId, TicketStatus, UserId};

use super::{RepositoryError, TicketStore};
use crate::models::{LocalUser, Product, Ticket, TicketReply, TicketSummary};

/// Kinds of request the store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListProducts,
    InsertTicket,
    UpsertUser,
    ListTickets,
    GetTicket,
    ListReplies,
    SetStatus,
    Ping,
}

#[derive(Debug, Default)]
struct Data {
    products: Vec<Product>,
    tickets: HashMap<TicketId, Ticket>,
    users: HashMap<UserId, LocalUser>,
    replies: Vec<TicketReply>,
}

impl Data {
    /// Join a ticket with its product name and reply count.
    fn summarize(&self, ticket: &Ticket) -> TicketSummary {
        let product_name = ticket.product_id.and_then(|pid| {
            self.products
                .iter()
                .find(|p| p.id == pid)
                .map(|p| p.name.clone())
        });
        let replies = self
            .replies
            .iter()
            .filter(|r| r.ticket_id == ticket.id)
            .count();
        TicketSummary {
            ticket: ticket.clone(),
            product_name,
            reply_count: i64::try_from(replies).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    calls: HashMap<StoreOp, usize>,
    failing: HashSet<StoreOp>,
}

/// Ticket store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    data: Mutex<Data>,
    ledger: SyncMutex<Ledger>,
}

impl InMemoryTicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with products.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            data: Mutex::new(Data {
                products,
                ..Data::default()
            }),
            ledger: SyncMutex::default(),
        }
    }

    /// Make every future request of `op` fail with `RepositoryError::Rejected`.
    pub fn fail(&self, op: StoreOp) {
        self.with_ledger(|l| {
            l.failing.insert(op);
        });
    }

    /// Stop failing requests of `op`.
    pub fn recover(&self, op: StoreOp) {
        self.with_ledger(|l| {
            l.failing.remove(&op);
        });
    }

    /// Number of requests of `op` received so far (including failed ones).
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.with_ledger(|l| l.calls.get(&op).copied().unwrap_or(0))
    }

    /// Total number of requests received so far.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.with_ledger(|l| l.calls.values().sum())
    }

    /// Insert a ticket directly, bypassing counters. For seeding tests.
    pub async fn seed_ticket(&self, ticket: Ticket) {
        self.data.lock().await.tickets.insert(ticket.id, ticket);
    }

    /// Add a reply directly. For seeding tests.
    pub async fn seed_reply(&self, reply: TicketReply) {
        self.data.lock().await.replies.push(reply);
    }

    /// Snapshot of one stored ticket.
    pub async fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.data.lock().await.tickets.get(&id).cloned()
    }

    /// Snapshot of one cached user.
    pub async fn user(&self, id: UserId) -> Option<LocalUser> {
        self.data.lock().await.users.get(&id).cloned()
    }

    fn with_ledger<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        // A poisoned ledger only means a test panicked mid-update; the counts
        // are still usable.
        let mut guard = self
            .ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    /// Count the request and fail it if `op` is switched off.
    fn record(&self, op: StoreOp) -> Result<(), RepositoryError> {
        self.with_ledger(|l| {
            *l.calls.entry(op).or_insert(0) += 1;
            if l.failing.contains(&op) {
                Err(RepositoryError::Rejected(format!("{op:?} is unavailable")))
            } else {
                Ok(())
            }
        })
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn list_available_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.record(StoreOp::ListProducts)?;
        let data = self.data.lock().await;
        let mut products: Vec<Product> =
            data.products.iter().filter(|p| p.available).cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<TicketId, RepositoryError> {
        self.record(StoreOp::InsertTicket)?;
        let mut data = self.data.lock().await;
        if data.tickets.contains_key(&ticket.id) {
            return Err(RepositoryError::Conflict("ticket already exists".to_owned()));
        }
        if let Some(product_id) = ticket.product_id
            && !data.products.iter().any(|p| p.id == product_id)
        {
            return Err(RepositoryError::Rejected(format!(
                "product {product_id} does not exist"
            )));
        }
        data.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket.id)
    }

    async fn upsert_user(&self, user: &LocalUser) -> Result<(), RepositoryError> {
        self.record(StoreOp::UpsertUser)?;
        self.data
            .lock()
            .await
            .users
            .entry(user.id)
            .or_insert_with(|| user.clone());
        Ok(())
    }

    async fn list_tickets(&self) -> Result<Vec<TicketSummary>, RepositoryError> {
        self.record(StoreOp::ListTickets)?;
        let data = self.data.lock().await;

        let mut summaries: Vec<TicketSummary> =
            data.tickets.values().map(|t| data.summarize(t)).collect();

        summaries.sort_by(|a, b| b.ticket.created_at.cmp(&a.ticket.created_at));
        Ok(summaries)
    }

    async fn get_ticket(&self, ticket_id: TicketId) -> Result<TicketSummary, RepositoryError> {
        self.record(StoreOp::GetTicket)?;
        let data = self.data.lock().await;
        data.tickets
            .get(&ticket_id)
            .map(|t| data.summarize(t))
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_replies(&self, ticket_id: TicketId) -> Result<Vec<TicketReply>, RepositoryError> {
        self.record(StoreOp::ListReplies)?;
        let data = self.data.lock().await;
        let mut replies: Vec<TicketReply> = data
            .replies
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect();
        replies.sort_by_key(|r| r.created_at);
        Ok(replies)
    }

    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.record(StoreOp::SetStatus)?;
        let mut data = self.data.lock().await;
        let ticket = data
            .tickets
            .get_mut(&ticket_id)
            .ok_or(RepositoryError::NotFound)?;
        ticket.status = status;
        ticket.updated_at = now;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.record(StoreOp::Ping)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use supportdesk_core::{ProductId, ReplyId, TicketCategory};

    use super::*;

    fn ticket(title: &str, created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: TicketId::generate(),
            user_id: UserId::for_username("ana"),
            title: title.to_owned(),
            description: "details".to_owned(),
            category: TicketCategory::Other,
            product_id: None,
            status: TicketStatus::Open,
            created_at,
            updated_at: created_at,
        }
    }

    fn product(name: &str, available: bool) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            available,
        }
    }

    #[tokio::test]
    async fn test_products_are_available_and_sorted() {
        let store = InMemoryTicketStore::with_products(vec![
            product("Kettle", true),
            product("Discontinued lamp", false),
            product("Blender", true),
        ]);

        let names: Vec<String> = store
            .list_available_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Blender", "Kettle"]);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_reply_counts() {
        let store = InMemoryTicketStore::new();
        let now = Utc::now();
        let older = ticket("older", now - Duration::hours(2));
        let newer = ticket("newer", now);
        store.seed_ticket(older.clone()).await;
        store.seed_ticket(newer.clone()).await;
        store
            .seed_reply(TicketReply {
                id: ReplyId::generate(),
                ticket_id: older.id,
                author_id: UserId::for_username("agent"),
                body: "On it".to_owned(),
                created_at: now,
            })
            .await;

        let list = store.list_tickets().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].ticket.title, "newer");
        assert_eq!(list[0].reply_count, 0);
        assert_eq!(list[1].reply_count, 1);
    }

    #[tokio::test]
    async fn test_upsert_ignores_conflicts() {
        let store = InMemoryTicketStore::new();
        let first = LocalUser {
            id: UserId::for_username("ana"),
            username: "ana".to_owned(),
            email: supportdesk_core::Email::fallback_for("ana"),
            role: supportdesk_core::UserRole::Customer,
        };
        let mut second = first.clone();
        second.username = "ana-renamed".to_owned();

        store.upsert_user(&first).await.unwrap();
        store.upsert_user(&second).await.unwrap();

        assert_eq!(store.user(first.id).await.unwrap().username, "ana");
        assert_eq!(store.calls(StoreOp::UpsertUser), 2);
    }

    #[tokio::test]
    async fn test_fail_and_recover() {
        let store = InMemoryTicketStore::new();
        store.fail(StoreOp::ListTickets);
        assert!(matches!(
            store.list_tickets().await,
            Err(RepositoryError::Rejected(_))
        ));
        store.recover(StoreOp::ListTickets);
        assert!(store.list_tickets().await.unwrap().is_empty());
        assert_eq!(store.calls(StoreOp::ListTickets), 2);
        assert_eq!(store.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_get_ticket() {
        let store = InMemoryTicketStore::new();
        let t = ticket("one", Utc::now());
        store.seed_ticket(t.clone()).await;

        assert_eq!(store.get_ticket(t.id).await.unwrap().ticket, t);
        assert!(matches!(
            store.get_ticket(TicketId::generate()).await,
            Err(RepositoryError::NotFound)
        ));
        assert_eq!(store.calls(StoreOp::GetTicket), 2);
    }

    #[tokio::test]
    async fn test_set_status_unknown_ticket() {
        let store = InMemoryTicketStore::new();
        let result = store
            .set_ticket_status(TicketId::generate(), TicketStatus::Closed, Utc::now())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
