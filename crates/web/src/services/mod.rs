//! Application services.
//!
//! Business workflows that sit between route handlers and the store.

pub mod tickets;

pub use tickets::{CreateTicketError, TicketCreationWorkflow, created_notice};
