//! Ticket list view state.
//!
//! ```text
//! Loading ──resolve──▶ Populated | Empty | Errored
//! Populated ──select──▶ Detail
//! Detail ──back──▶ Loading
//! ```
//!
//! Any other transition is refused with [`TransitionError`] and leaves the
//! state as it was.

use thiserror::Error;

use supportdesk_core::{TicketId, TicketStatus};

use crate::models::TicketSummary;

/// A refused transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} while {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    #[error("ticket {0} is not in the current list")]
    UnknownTicket(TicketId),
}

/// Current state of the ticket list surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TicketListView {
    /// Fetch in progress.
    #[default]
    Loading,
    /// At least one ticket, newest first.
    Populated(Vec<TicketSummary>),
    /// Fetch succeeded with no tickets.
    Empty,
    /// Fetch failed; the list renders empty.
    Errored { message: String },
    /// One ticket from the snapshot is selected.
    Detail {
        tickets: Vec<TicketSummary>,
        selected: TicketId,
    },
}

impl TicketListView {
    /// Start a fetch.
    #[must_use]
    pub const fn loading() -> Self {
        Self::Loading
    }

    /// Name of the current state, for errors and logs.
    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Populated(_) => "populated",
            Self::Empty => "empty",
            Self::Errored { .. } => "errored",
            Self::Detail { .. } => "showing a ticket",
        }
    }

    /// Apply a fetch result. Only valid while `Loading`.
    ///
    /// The snapshot is re-sorted newest first so rendering order never
    /// depends on the store.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] outside `Loading`.
    pub fn resolve(
        &mut self,
        fetched: Result<Vec<TicketSummary>, String>,
    ) -> Result<(), TransitionError> {
        self.require(matches!(self, Self::Loading), "resolve a fetch")?;

        *self = match fetched {
            Ok(tickets) if tickets.is_empty() => Self::Empty,
            Ok(mut tickets) => {
                tickets.sort_by(|a, b| b.ticket.created_at.cmp(&a.ticket.created_at));
                Self::Populated(tickets)
            }
            Err(message) => Self::Errored { message },
        };
        Ok(())
    }

    /// Open a ticket from the list.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] unless `Populated`, or
    /// [`TransitionError::UnknownTicket`] if `id` is not in the snapshot.
    pub fn select(&mut self, id: TicketId) -> Result<(), TransitionError> {
        let Self::Populated(tickets) = self else {
            return Err(self.invalid("select a ticket"));
        };
        if !tickets.iter().any(|t| t.id() == id) {
            return Err(TransitionError::UnknownTicket(id));
        }

        let tickets = std::mem::take(tickets);
        *self = Self::Detail {
            tickets,
            selected: id,
        };
        Ok(())
    }

    /// Leave the detail surface. The list must be fetched again.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] unless in `Detail`.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        self.require(matches!(self, Self::Detail { .. }), "go back")?;
        *self = Self::Loading;
        Ok(())
    }

    /// Tickets in the current snapshot (empty unless populated or in detail).
    #[must_use]
    pub fn tickets(&self) -> &[TicketSummary] {
        match self {
            Self::Populated(tickets) | Self::Detail { tickets, .. } => tickets,
            Self::Loading | Self::Empty | Self::Errored { .. } => &[],
        }
    }

    /// The selected ticket while in `Detail`.
    #[must_use]
    pub fn selected(&self) -> Option<&TicketSummary> {
        match self {
            Self::Detail { tickets, selected } => tickets.iter().find(|t| t.id() == *selected),
            _ => None,
        }
    }

    /// Fetch error message while in `Errored`.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Errored { message } => Some(message),
            _ => None,
        }
    }

    /// Whether the empty-state message should be shown.
    #[must_use]
    pub const fn is_empty_state(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Number of tickets in the snapshot with status `open`.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.count_status(TicketStatus::Open)
    }

    /// Number of tickets in the snapshot with status `closed`.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.count_status(TicketStatus::Closed)
    }

    fn count_status(&self, status: TicketStatus) -> usize {
        self.tickets().iter().filter(|t| t.status() == status).count()
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidState {
            state: self.state_name(),
            action,
        }
    }

    fn require(&self, ok: bool, action: &'static str) -> Result<(), TransitionError> {
        if ok { Ok(()) } else { Err(self.invalid(action)) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use supportdesk_core::{TicketCategory, UserId};

    use super::*;
    use crate::models::Ticket;

    fn summary(title: &str, status: TicketStatus, age_minutes: i64) -> TicketSummary {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        TicketSummary {
            ticket: Ticket {
                id: TicketId::generate(),
                user_id: UserId::for_username("ana"),
                title: title.to_owned(),
                description: "details".to_owned(),
                category: TicketCategory::Account,
                product_id: None,
                status,
                created_at,
                updated_at: created_at,
            },
            product_name: None,
            reply_count: 0,
        }
    }

    fn populated() -> (TicketListView, Vec<TicketSummary>) {
        let tickets = vec![
            summary("a", TicketStatus::Open, 30),
            summary("b", TicketStatus::Closed, 10),
            summary("c", TicketStatus::Open, 20),
        ];
        let mut view = TicketListView::loading();
        view.resolve(Ok(tickets.clone())).unwrap();
        (view, tickets)
    }

    #[test]
    fn test_resolve_empty() {
        let mut view = TicketListView::loading();
        view.resolve(Ok(vec![])).unwrap();

        assert!(view.is_empty_state());
        assert_eq!(view.open_count(), 0);
        assert_eq!(view.closed_count(), 0);
    }

    #[test]
    fn test_resolve_sorts_newest_first() {
        let (view, _) = populated();
        let titles: Vec<&str> = view.tickets().iter().map(|t| t.ticket.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_counters_match_snapshot() {
        let (view, tickets) = populated();
        let open = tickets.iter().filter(|t| t.status() == TicketStatus::Open).count();
        let closed = tickets.iter().filter(|t| t.status() == TicketStatus::Closed).count();

        assert_eq!(view.open_count(), open);
        assert_eq!(view.closed_count(), closed);
        assert_eq!(view.open_count() + view.closed_count(), tickets.len());
    }

    #[test]
    fn test_resolve_error_leaves_list_empty() {
        let mut view = TicketListView::loading();
        view.resolve(Err("backend down".to_owned())).unwrap();

        assert_eq!(view.error(), Some("backend down"));
        assert!(view.tickets().is_empty());
        assert!(!view.is_empty_state());
        assert_eq!(view.open_count(), 0);
    }

    #[test]
    fn test_resolve_twice_is_refused() {
        let (mut view, _) = populated();
        let before = view.clone();

        let err = view.resolve(Ok(vec![])).unwrap_err();

        assert_eq!(
            err,
            TransitionError::InvalidState {
                state: "populated",
                action: "resolve a fetch"
            }
        );
        assert_eq!(view, before);
    }

    #[test]
    fn test_select_and_back() {
        let (mut view, tickets) = populated();
        let target = tickets[1].id();

        view.select(target).unwrap();
        assert_eq!(view.selected().unwrap().id(), target);
        assert_eq!(view.open_count(), 2);

        view.back().unwrap();
        assert_eq!(view, TicketListView::Loading);
    }

    #[test]
    fn test_select_unknown_ticket() {
        let (mut view, _) = populated();
        let missing = TicketId::generate();
        assert_eq!(
            view.select(missing),
            Err(TransitionError::UnknownTicket(missing))
        );
        assert!(matches!(view, TicketListView::Populated(_)));
    }

    #[test]
    fn test_select_requires_populated() {
        let mut view = TicketListView::loading();
        view.resolve(Ok(vec![])).unwrap();
        assert!(matches!(
            view.select(TicketId::generate()),
            Err(TransitionError::InvalidState { state: "empty", .. })
        ));
    }

    #[test]
    fn test_back_requires_detail() {
        let mut view = TicketListView::loading();
        assert!(view.back().is_err());
        assert_eq!(view, TicketListView::Loading);
    }
}
