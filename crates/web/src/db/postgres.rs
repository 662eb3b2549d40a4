//! `PostgreSQL` implementation of [`TicketStore`].
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! internal `FromRow` row types. Ticket rows are checked on the way out and
//! rejected as [`RepositoryError::DataCorruption`] if they break invariants
//! the schema cannot express.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use supportdesk_core::{
    ProductId, ReplyId, TicketCategory, TicketId, TicketStatus, UserId,
};

use super::{RepositoryError, TicketStore};
use crate::models::{LocalUser, Product, Ticket, TicketReply, TicketSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    available: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            available: row.available,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketSummaryRow {
    id: TicketId,
    user_id: UserId,
    title: String,
    description: String,
    category: TicketCategory,
    product_id: Option<ProductId>,
    status: TicketStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: Option<String>,
    reply_count: Option<i64>,
}

impl TryFrom<TicketSummaryRow> for TicketSummary {
    type Error = RepositoryError;

    fn try_from(row: TicketSummaryRow) -> Result<Self, Self::Error> {
        let reply_count = row.reply_count.unwrap_or(0);
        if reply_count < 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "ticket {} has a negative reply count ({reply_count})",
                row.id
            )));
        }
        if row.updated_at < row.created_at {
            return Err(RepositoryError::DataCorruption(format!(
                "ticket {} was updated before it was created",
                row.id
            )));
        }

        Ok(Self {
            ticket: Ticket {
                id: row.id,
                user_id: row.user_id,
                title: row.title,
                description: row.description,
                category: row.category,
                product_id: row.product_id,
                status: row.status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            product_name: row.product_name,
            reply_count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReplyRow {
    id: ReplyId,
    ticket_id: TicketId,
    author_id: UserId,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ReplyRow> for TicketReply {
    fn from(row: ReplyRow) -> Self {
        Self {
            id: row.id,
            ticket_id: row.ticket_id,
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Tickets joined with product name and reply count.
const TICKET_SUMMARY_SELECT: &str = r"
    SELECT t.id, t.user_id, t.title, t.description, t.category,
           t.product_id, t.status, t.created_at, t.updated_at,
           p.name AS product_name,
           r.reply_count
    FROM desk.tickets t
    LEFT JOIN desk.products p ON p.id = t.product_id
    LEFT JOIN (
        SELECT ticket_id, COUNT(*) AS reply_count
        FROM desk.ticket_replies
        GROUP BY ticket_id
    ) r ON r.ticket_id = t.id
";

/// Ticket store backed by the `desk` schema.
#[derive(Debug, Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product, or update availability of the one with the same
    /// name. Returns the stored product. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_product(
        &self,
        name: &str,
        available: bool,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO desk.products (id, name, available)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET available = EXCLUDED.available
            RETURNING id, name, available
            ",
        )
        .bind(ProductId::generate())
        .bind(name)
        .bind(available)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn list_available_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, available
            FROM desk.products
            WHERE available
            ORDER BY name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<TicketId, RepositoryError> {
        let id: TicketId = sqlx::query_scalar(
            r"
            INSERT INTO desk.tickets (
                id, user_id, title, description, category, product_id,
                status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(ticket.id)
        .bind(ticket.user_id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.category)
        .bind(ticket.product_id)
        .bind(ticket.status)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("ticket already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }

    async fn upsert_user(&self, user: &LocalUser) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO desk.users (id, username, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_tickets(&self) -> Result<Vec<TicketSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, TicketSummaryRow>(&format!(
            "{TICKET_SUMMARY_SELECT} ORDER BY t.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TicketSummary::try_from).collect()
    }

    async fn get_ticket(&self, ticket_id: TicketId) -> Result<TicketSummary, RepositoryError> {
        let row = sqlx::query_as::<_, TicketSummaryRow>(&format!(
            "{TICKET_SUMMARY_SELECT} WHERE t.id = $1"
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn list_replies(&self, ticket_id: TicketId) -> Result<Vec<TicketReply>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReplyRow>(
            r"
            SELECT id, ticket_id, author_id, body, created_at
            FROM desk.ticket_replies
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TicketReply::from).collect())
    }

    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE desk.tickets
            SET status = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(status)
        .bind(now)
        .bind(ticket_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn row(reply_count: Option<i64>) -> TicketSummaryRow {
        let created_at = Utc::now();
        TicketSummaryRow {
            id: TicketId::generate(),
            user_id: UserId::for_username("ana"),
            title: "Late delivery".to_owned(),
            description: "Order has not arrived".to_owned(),
            category: TicketCategory::Orders,
            product_id: None,
            status: TicketStatus::Open,
            created_at,
            updated_at: created_at,
            product_name: None,
            reply_count,
        }
    }

    #[test]
    fn test_missing_reply_count_is_zero() {
        let summary = TicketSummary::try_from(row(None)).unwrap();
        assert_eq!(summary.reply_count, 0);
        assert_eq!(summary.status(), TicketStatus::Open);
    }

    #[test]
    fn test_negative_reply_count_is_corruption() {
        let err = TicketSummary::try_from(row(Some(-1))).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_update_before_creation_is_corruption() {
        let mut bad = row(Some(2));
        bad.updated_at = bad.created_at - Duration::seconds(1);

        let err = TicketSummary::try_from(bad).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(ref msg) if msg.contains("updated before")));
    }
}
