//! "New ticket" dialog state.
//!
//! The dialog owns the in-progress [`TicketDraft`]. A successful submit resets
//! the form, closes the dialog and notifies the caller exactly once; a failed
//! submit keeps everything the user typed and stays open.

use chrono::{DateTime, Utc};

use supportdesk_core::TicketDraft;

use crate::models::{CurrentActor, Notice};
use crate::services::{TicketCreationWorkflow, created_notice};

/// Visibility plus form contents of the creation dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationDialog {
    open: bool,
    draft: TicketDraft,
}

impl CreationDialog {
    /// A closed dialog with an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dialog showing `draft`, as when re-rendering after a failed submit.
    #[must_use]
    pub fn with_draft(draft: TicketDraft) -> Self {
        Self { open: true, draft }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Show or hide the dialog. The form contents are left alone.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    #[must_use]
    pub const fn draft(&self) -> &TicketDraft {
        &self.draft
    }

    /// Mutable access for field-by-field edits.
    pub fn draft_mut(&mut self) -> &mut TicketDraft {
        &mut self.draft
    }

    /// Submit the current form through `workflow`.
    ///
    /// On success the form is reset to its initial values, the dialog closes
    /// and `on_created` runs once. On failure nothing changes and
    /// `on_created` is not called.
    ///
    /// Either way, the returned [`Notice`] is what the user should see.
    pub async fn submit<F>(
        &mut self,
        workflow: &TicketCreationWorkflow<'_>,
        actor: Option<&CurrentActor>,
        now: DateTime<Utc>,
        on_created: F,
    ) -> Notice
    where
        F: FnOnce(),
    {
        match workflow.submit(actor, &self.draft, now).await {
            Ok(ticket) => {
                self.draft = TicketDraft::default();
                self.open = false;
                on_created();
                created_notice(&ticket)
            }
            Err(err) => err.notice(),
        }
    }
}
