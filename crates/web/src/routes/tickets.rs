//! Ticket route handlers.
//!
//! The list page is a shell: its list region loads `/tickets/list` on page
//! load and again whenever a `tickets-changed` event fires. The creation
//! dialog is swapped into the page from `/tickets/new` and posts back to
//! `/tickets`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tower_sessions::Session;
use tracing::instrument;

use supportdesk_core::{
    ProductChoice, TicketCategory, TicketDraft, TicketId, TicketStatus, ValidationError,
};

use crate::components::{CreationDialog, TicketListView};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{OptionalActor, RequireActor, push_flash, take_flash};
use crate::models::{CurrentActor, Notice, Product, TicketReply, TicketSummary};
use crate::routes::htmx::HxTrigger;
use crate::services::{CreateTicketError, TicketCreationWorkflow};
use crate::state::AppState;

/// Characters of description shown in a list row.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Date format for list rows and the detail page.
const DATE_FORMAT: &str = "%b %-d, %Y";

// =============================================================================
// View Types
// =============================================================================

/// A ticket as rendered in the list and on the detail page.
#[derive(Debug, Clone)]
pub struct TicketSummaryView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub description_preview: String,
    pub category_label: &'static str,
    pub category_class: &'static str,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub product_name: Option<String>,
    pub reply_count: i64,
    pub created_on: String,
    pub updated_on: String,
}

impl From<&TicketSummary> for TicketSummaryView {
    fn from(summary: &TicketSummary) -> Self {
        let ticket = &summary.ticket;
        Self {
            id: ticket.id.to_string(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            description_preview: preview(&ticket.description, DESCRIPTION_PREVIEW_CHARS),
            category_label: ticket.category.as_str(),
            category_class: category_class(ticket.category),
            status_label: ticket.status.label(),
            status_class: status_class(ticket.status),
            product_name: summary.product_name.clone(),
            reply_count: summary.reply_count,
            created_on: format_date(ticket.created_at),
            updated_on: format_date(ticket.updated_at),
        }
    }
}

/// First `max` characters of `text`, with an ellipsis if anything was cut.
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

const fn category_class(category: TicketCategory) -> &'static str {
    match category {
        TicketCategory::Account => "badge badge--account",
        TicketCategory::Orders => "badge badge--orders",
        TicketCategory::Other => "badge badge--other",
    }
}

const fn status_class(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "badge badge--open",
        TicketStatus::Closed => "badge badge--closed",
    }
}

/// One reply on the detail page.
#[derive(Debug, Clone)]
pub struct ReplyView {
    pub body: String,
    pub created_on: String,
}

impl From<&TicketReply> for ReplyView {
    fn from(reply: &TicketReply) -> Self {
        Self {
            body: reply.body.clone(),
            created_on: format_date(reply.created_at),
        }
    }
}

/// An `<option>` in a form `<select>`.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
}

// =============================================================================
// Form Types
// =============================================================================

/// Creation dialog form data.
#[derive(Debug, Deserialize)]
pub struct CreateTicketForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Empty means "not chosen yet"; anything outside the enumeration is a
    /// deserialization error.
    #[serde(default, deserialize_with = "category_or_unset")]
    pub category: Option<TicketCategory>,
    #[serde(default)]
    pub product: Option<String>,
}

impl CreateTicketForm {
    /// The draft to submit, plus any error in the product selection.
    ///
    /// An unusable product value is reported separately and replaced by
    /// "no product".
    fn into_draft(self) -> (TicketDraft, Option<ValidationError>) {
        let (product, error) = match ProductChoice::parse(self.product.as_deref()) {
            Ok(product) => (product, None),
            Err(e) => (ProductChoice::NONE, Some(e)),
        };
        let draft = TicketDraft {
            title: self.title,
            description: self.description,
            category: self.category,
            product,
        };
        (draft, error)
    }
}

fn category_or_unset<'de, D>(deserializer: D) -> Result<Option<TicketCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Full list page.
#[derive(Template, WebTemplate)]
#[template(path = "tickets/index.html")]
pub struct TicketsPageTemplate {
    pub actor: CurrentActor,
    pub flash: Option<Notice>,
}

/// List fragment (`#ticket-list`).
#[derive(Template, WebTemplate)]
#[template(path = "tickets/_list.html")]
pub struct TicketListTemplate {
    pub tickets: Vec<TicketSummaryView>,
    pub open_count: usize,
    pub closed_count: usize,
    pub empty: bool,
    pub error: Option<String>,
}

impl From<&TicketListView> for TicketListTemplate {
    fn from(view: &TicketListView) -> Self {
        Self {
            tickets: view.tickets().iter().map(TicketSummaryView::from).collect(),
            open_count: view.open_count(),
            closed_count: view.closed_count(),
            empty: view.is_empty_state(),
            error: view.error().map(str::to_owned),
        }
    }
}

/// Creation dialog fragment (`#ticket-dialog`).
#[derive(Template, WebTemplate)]
#[template(path = "tickets/_dialog.html")]
pub struct CreationDialogTemplate {
    pub open: bool,
    pub title: String,
    pub description: String,
    pub category: String,
    pub product: String,
    pub categories: Vec<OptionView>,
    pub products: Vec<OptionView>,
}

impl CreationDialogTemplate {
    fn new(dialog: &CreationDialog, products: &[Product]) -> Self {
        let draft = dialog.draft();
        Self {
            open: dialog.is_open(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft
                .category
                .map(|c| c.as_str().to_owned())
                .unwrap_or_default(),
            product: draft.product.form_value(),
            categories: TicketCategory::ALL
                .into_iter()
                .map(|c| OptionView {
                    value: c.as_str().to_owned(),
                    label: c.as_str().to_owned(),
                })
                .collect(),
            products: products
                .iter()
                .map(|p| OptionView {
                    value: p.id.to_string(),
                    label: p.name.clone(),
                })
                .collect(),
        }
    }
}

/// Ticket detail page.
#[derive(Template, WebTemplate)]
#[template(path = "tickets/detail.html")]
pub struct TicketDetailTemplate {
    pub actor: CurrentActor,
    pub flash: Option<Notice>,
    pub ticket: TicketSummaryView,
    pub replies: Vec<ReplyView>,
    pub toggle_label: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// List page shell. The list itself is loaded by `list_fragment`.
#[instrument(skip_all, fields(actor = %actor.username))]
pub async fn index(RequireActor(actor): RequireActor, session: Session) -> impl IntoResponse {
    let flash = take_flash(&session).await;
    TicketsPageTemplate { actor, flash }
}

/// Fetch and render the ticket list (HTMX).
///
/// A failed fetch renders an empty list and fires an error toast.
#[instrument(skip_all)]
pub async fn list_fragment(
    State(state): State<AppState>,
    RequireActor(_actor): RequireActor,
) -> Result<impl IntoResponse, AppError> {
    let mut view = TicketListView::loading();

    let fetched = state.store().list_tickets().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch tickets");
        e.user_message()
    });
    view.resolve(fetched)?;

    let trigger = match view.error() {
        Some(message) => HxTrigger::new().notify(&Notice::error("Could not load tickets", message)),
        None => HxTrigger::new(),
    };

    Ok((trigger, TicketListTemplate::from(&view)))
}

/// Open the creation dialog with an empty form (HTMX).
#[instrument(skip_all)]
pub async fn new_dialog(
    State(state): State<AppState>,
    RequireActor(_actor): RequireActor,
) -> impl IntoResponse {
    let mut dialog = CreationDialog::new();
    dialog.set_open(true);

    // A dialog that cannot list products still opens, offering only "no product".
    match state.store().list_available_products().await {
        Ok(products) => (HxTrigger::new(), CreationDialogTemplate::new(&dialog, &products)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            let notice = Notice::error("Could not load products", e.user_message());
            (
                HxTrigger::new().notify(&notice),
                CreationDialogTemplate::new(&dialog, &[]),
            )
        }
    }
}

/// Submit the creation dialog (HTMX).
///
/// The outcome toast travels in `HX-Trigger`. After success the response is
/// the closed, empty dialog plus `tickets-changed`. After failure the swap is
/// cancelled with `HX-Reswap: none`, so the form the user filled in stays on
/// screen untouched and no further store request is made.
#[instrument(skip_all, fields(actor = ?actor.as_ref().map(|a| &a.username)))]
pub async fn create(
    State(state): State<AppState>,
    OptionalActor(actor): OptionalActor,
    Form(form): Form<CreateTicketForm>,
) -> Response {
    let (draft, product_error) = form.into_draft();
    let mut dialog = CreationDialog::with_draft(draft);

    if let Some(err) = product_error {
        let notice = CreateTicketError::from(err).notice();
        return keep_dialog(HxTrigger::new().notify(&notice));
    }

    let workflow = TicketCreationWorkflow::new(state.store());
    let mut created = false;
    let notice = dialog
        .submit(&workflow, actor.as_ref(), Utc::now(), || created = true)
        .await;

    let trigger = HxTrigger::new().notify(&notice);
    if !created {
        return keep_dialog(trigger);
    }

    add_breadcrumb("tickets", "Created ticket", None);
    (
        trigger.tickets_changed(),
        CreationDialogTemplate::new(&dialog, &[]),
    )
        .into_response()
}

/// Leave the dialog as it is on the client and only fire `trigger`.
fn keep_dialog(trigger: HxTrigger) -> Response {
    (trigger, AppendHeaders([("HX-Reswap", "none")])).into_response()
}

/// Ticket detail page.
///
/// Walks the list view through `Loading -> Populated -> Detail`; a ticket that
/// is not in the fetched list is a 404.
#[instrument(skip(state, session, actor), fields(actor = %actor.username))]
pub async fn detail(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    session: Session,
    Path(id): Path<TicketId>,
) -> Result<impl IntoResponse, AppError> {
    let mut view = TicketListView::loading();
    let tickets = state.store().list_tickets().await?;
    view.resolve(Ok(tickets))?;

    if let Err(e) = view.select(id) {
        tracing::debug!(error = %e, "Ticket not selectable");
        return Err(AppError::NotFound(format!("ticket {id}")));
    }
    let ticket = view
        .selected()
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))?;

    let replies = state.store().list_replies(id).await?;
    let flash = take_flash(&session).await;

    Ok(TicketDetailTemplate {
        actor,
        flash,
        toggle_label: toggle_label(ticket.status()),
        ticket: TicketSummaryView::from(ticket),
        replies: replies.iter().map(ReplyView::from).collect(),
    })
}

const fn toggle_label(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "Close ticket",
        TicketStatus::Closed => "Reopen ticket",
    }
}

/// Toggle a ticket between open and closed, then return to its page.
#[instrument(skip(state, session, actor), fields(actor = %actor.username))]
pub async fn toggle_status(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    session: Session,
    Path(id): Path<TicketId>,
) -> Result<Redirect, AppError> {
    let current = state.store().get_ticket(id).await?;
    let next = current.status().toggled();

    state
        .store()
        .set_ticket_status(id, next, Utc::now())
        .await?;
    tracing::info!(ticket_id = %id, status = %next, "Ticket status changed");

    let id_str = id.to_string();
    add_breadcrumb(
        "tickets",
        "Changed ticket status",
        Some(&[("ticket_id", id_str.as_str()), ("status", next.as_str())]),
    );

    let title = &current.ticket.title;
    let notice = match next {
        TicketStatus::Closed => {
            Notice::success("Ticket closed", format!("\"{title}\" has been closed."))
        }
        TicketStatus::Open => {
            Notice::success("Ticket reopened", format!("\"{title}\" is open again."))
        }
    };
    push_flash(&session, &notice).await;

    Ok(Redirect::to(&format!("/tickets/{id}")))
}
