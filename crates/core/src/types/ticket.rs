//! Ticket draft validation.
//!
//! A [`TicketDraft`] is whatever the creation form holds; [`TicketDraft::validate`]
//! turns it into a [`ValidTicket`] or says which required fields are missing.
//! Nothing in here talks to the store, so a rejected draft never costs a
//! backend request.

use serde::Serialize;

use super::{ProductId, TicketCategory};

/// Sentinel form value meaning "no related product".
pub const NO_PRODUCT: &str = "none";

/// A required input on the ticket form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    Title,
    Description,
    Category,
}

impl TicketField {
    /// Human label used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Category => "category",
        }
    }
}

/// Why a draft was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One or more required fields are empty or unset.
    #[error("please fill in all required fields: {}", join_labels(.0))]
    MissingFields(Vec<TicketField>),

    /// A field exceeds its maximum length.
    #[error("{} must be at most {max} characters", .field.label())]
    TooLong {
        /// Offending field.
        field: TicketField,
        /// Maximum allowed characters.
        max: usize,
    },

    /// The product selection is neither the sentinel nor a product ID.
    #[error("unknown product selection: {0:?}")]
    InvalidProduct(String),
}

fn join_labels(fields: &[TicketField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Optional product picked on the form.
///
/// The `<select>` submits either [`NO_PRODUCT`] or a product UUID; the
/// sentinel (and an empty value) become `None` instead of being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductChoice(Option<ProductId>);

impl ProductChoice {
    /// No product selected.
    pub const NONE: Self = Self(None);

    /// A specific product.
    #[must_use]
    pub const fn product(id: ProductId) -> Self {
        Self(Some(id))
    }

    /// Parse the raw form value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProduct`] if the value is neither
    /// empty, the sentinel, nor a UUID.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim) {
            None | Some("" | NO_PRODUCT) => Ok(Self::NONE),
            Some(value) => value
                .parse::<ProductId>()
                .map(Self::product)
                .map_err(|_| ValidationError::InvalidProduct(value.to_owned())),
        }
    }

    /// The selected product, if any.
    #[must_use]
    pub const fn id(self) -> Option<ProductId> {
        self.0
    }

    /// Value to pre-select in the form.
    #[must_use]
    pub fn form_value(self) -> String {
        self.0
            .map_or_else(|| NO_PRODUCT.to_owned(), |id| id.to_string())
    }
}

/// Unvalidated form contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub category: Option<TicketCategory>,
    pub product: ProductChoice,
}

/// A draft that passed validation. Text fields are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTicket {
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub product_id: Option<ProductId>,
}

impl TicketDraft {
    /// Maximum title length in characters.
    pub const TITLE_MAX_CHARS: usize = 200;

    /// Maximum description length in characters.
    pub const DESCRIPTION_MAX_CHARS: usize = 10_000;

    /// Whether every input is at its empty default.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Check required fields and lengths.
    ///
    /// All missing fields are reported together, in form order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] when title, description or
    /// category is empty/unset, or [`ValidationError::TooLong`] when a text
    /// field exceeds its limit.
    pub fn validate(&self) -> Result<ValidTicket, ValidationError> {
        let title = self.title.trim();
        let description = self.description.trim();

        let mut missing = Vec::new();
        if title.is_empty() {
            missing.push(TicketField::Title);
        }
        if description.is_empty() {
            missing.push(TicketField::Description);
        }
        let Some(category) = self.category else {
            missing.push(TicketField::Category);
            return Err(ValidationError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        if title.chars().count() > Self::TITLE_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: TicketField::Title,
                max: Self::TITLE_MAX_CHARS,
            });
        }
        if description.chars().count() > Self::DESCRIPTION_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: TicketField::Description,
                max: Self::DESCRIPTION_MAX_CHARS,
            });
        }

        Ok(ValidTicket {
            title: title.to_owned(),
            description: description.to_owned(),
            category,
            product_id: self.product.id(),
        })
    }
}
