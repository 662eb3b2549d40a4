//! View-state components rendered by the ticket routes.

pub mod creation_dialog;
pub mod ticket_list;

pub use creation_dialog::CreationDialog;
pub use ticket_list::{TicketListView, TransitionError};
