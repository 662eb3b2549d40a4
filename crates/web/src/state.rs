//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DeskConfig;
use crate::db::TicketStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store is a trait object so the router
/// runs unchanged over `PostgreSQL` or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DeskConfig,
    store: Arc<dyn TicketStore>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: DeskConfig, store: Arc<dyn TicketStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &DeskConfig {
        &self.inner.config
    }

    /// Get a reference to the ticket store.
    #[must_use]
    pub fn store(&self) -> &dyn TicketStore {
        self.inner.store.as_ref()
    }
}
