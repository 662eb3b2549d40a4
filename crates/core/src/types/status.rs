//! Closed enumerations for tickets and users.
//!
//! Each enum maps to a `PostgreSQL` enum type in the `desk` schema (with the
//! `postgres` feature) and round-trips through its wire string via
//! `Display`/`FromStr`, which is what HTML form values use.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a member of one of the enums below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Ticket lifecycle status. New tickets always start `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "desk.ticket_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

impl TicketStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 2] = [Self::Open, Self::Closed];

    /// The status a toggle moves to.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }

    /// Wire value (`open` / `closed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Human label for badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("ticket status", s))
    }
}

/// What a ticket is about.
///
/// Deliberately closed: the creation form offers exactly these values and
/// anything else fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "desk.ticket_category", rename_all = "PascalCase")
)]
#[serde(rename_all = "PascalCase")]
pub enum TicketCategory {
    Account,
    Orders,
    Other,
}

impl TicketCategory {
    /// All categories, in the order the form lists them.
    pub const ALL: [Self; 3] = [Self::Account, Self::Orders, Self::Other];

    /// Wire value, also used as the label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Orders => "Orders",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("ticket category", s))
    }
}

/// Role recorded in the local user cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "desk.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Someone filing tickets. Default for every cached user.
    #[default]
    Customer,
    /// Support staff answering tickets.
    Agent,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "agent" => Ok(Self::Agent),
            _ => Err(UnknownVariant::new("user role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_open() {
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(TicketStatus::Open.toggled(), TicketStatus::Closed);
        assert_eq!(TicketStatus::Closed.toggled(), TicketStatus::Open);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TicketStatus::Closed).unwrap(), "\"closed\"");
        assert_eq!("open".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert!("Open".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_status_parses_every_variant() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }
        assert!("pending".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_category_is_closed() {
        assert_eq!(
            "Orders".parse::<TicketCategory>().unwrap(),
            TicketCategory::Orders
        );
        assert!("Billing".parse::<TicketCategory>().is_err());
        assert!("orders".parse::<TicketCategory>().is_err());
        assert!(serde_json::from_str::<TicketCategory>("\"Shipping\"").is_err());
    }

    #[test]
    fn test_category_serde_matches_display() {
        for category in TicketCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }

    #[test]
    fn test_role_defaults_to_customer() {
        assert_eq!(UserRole::default(), UserRole::Customer);
        assert_eq!(UserRole::default().to_string(), "customer");
        assert_eq!("agent".parse::<UserRole>().unwrap(), UserRole::Agent);
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "pending".parse::<TicketStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid ticket status: \"pending\"");
    }
}
