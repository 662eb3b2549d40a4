//! Session-related types.
//!
//! Types stored in the session for authentication state and flash notices.

use serde::{Deserialize, Serialize};

use supportdesk_core::UserId;

/// Session-stored identity of the signed-in actor.
///
/// `id` is derived from the provider username, so it is the same on every
/// sign-in and can key the local `users` cache directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentActor {
    /// Authoritative user ID.
    pub id: UserId,
    /// Username as given by the identity provider.
    pub username: String,
    /// Email, when the provider supplied one.
    pub email: Option<String>,
}

impl CurrentActor {
    /// Build the actor for a provider username.
    #[must_use]
    pub fn new(username: &str, email: Option<String>) -> Self {
        Self {
            id: UserId::for_username(username),
            username: username.trim().to_owned(),
            email: email.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in actor.
    pub const CURRENT_ACTOR: &str = "current_actor";

    /// Key for a one-shot notice shown on the next full page load.
    pub const FLASH: &str = "flash";
}
