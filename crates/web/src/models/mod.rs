//! Domain models for SupportDesk.

pub mod notice;
pub mod session;
pub mod ticket;

pub use notice::{Notice, Severity};
pub use session::{CurrentActor, keys as session_keys};
pub use ticket::{LocalUser, Product, Ticket, TicketReply, TicketSummary};
