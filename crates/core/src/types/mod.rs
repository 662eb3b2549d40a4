//! Core types for SupportDesk.
//!
//! This module provides type-safe wrappers for the ticketing domain.

pub mod email;
pub mod id;
pub mod status;
pub mod ticket;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
pub use ticket::{
    NO_PRODUCT, ProductChoice, TicketDraft, TicketField, ValidTicket, ValidationError,
};
