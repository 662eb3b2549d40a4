//! HTTP middleware for SupportDesk.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, signed cookie)

pub mod auth;
pub mod session;

pub use auth::{
    AuthRejection, OptionalActor, RequireActor, clear_current_actor, push_flash, set_current_actor,
    take_flash,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
