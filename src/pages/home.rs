use axum::{
    extract::{Path, Query, State},
    response::Response,
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::EntryRequest;
use crate::error::AppError;
use crate::models::entry::StoredEntry;
use crate::models::user::Profile;
use crate::view::flash::Flash;
use crate::view::layout::NavPage;
use crate::view::modal::{open_href, render_modal, Modal, ModalQuery, ModalState};
use crate::view::render::{escape_html, format_date, format_long_date, format_time, text_preview};
use crate::AppState;

use super::SignedIn;

/// Editor form. `entry_id` is blank for a new entry.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub entry_id: String,
    pub title: String,
    pub content: String,
}

impl EntryForm {
    fn entry_id(&self) -> Result<Option<Uuid>, AppError> {
        match self.entry_id.trim() {
            "" => Ok(None),
            raw => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| AppError::Validation("Invalid entry id".into())),
        }
    }
}

/// GET /home
pub async fn show(
    State(state): State<AppState>,
    page: SignedIn,
    query: Option<Query<ModalQuery>>,
) -> Response {
    let SignedIn { ctx, session } = page;

    // The page still works without a profile; the name falls back to the email.
    let profile = state
        .backend
        .get_profile(session.user_id)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(user_id = %session.user_id, error = %err, "Profile lookup failed");
            None
        });
    let entries = match state.backend.list_entries(session.user_id).await {
        Ok(entries) => entries,
        Err(err) => {
            let flash = super::failure("Error loading entries", &err);
            return ctx.render("Home", Some(NavPage::Home), &flash.render());
        }
    };

    let modals = ModalState::from_query(&query.map(|Query(q)| q).unwrap_or_default());
    let current = modals
        .current_entry()
        .and_then(|id| entries.iter().find(|e| e.id == id));
    if modals.current_entry().is_some() && current.is_none() {
        return ctx.redirect_with("/home", Flash::error("Error loading entry: Entry not found"));
    }

    let name = Profile::display_name(profile.as_ref(), &session.email);
    let today = chrono::Utc::now().date_naive();

    let main = format!(
        r#"<section class="main-content">
  <div class="welcome">
    <h1>Hello, <span id="userName">{name}</span></h1>
    <p id="currentDate">{today}</p>
  </div>
  <div class="entries-header">
    <h2>Your Entries <span class="count" id="entriesCount">{count}</span></h2>
    <a class="btn btn-primary" href="{new_href}">+ New Entry</a>
  </div>
  {list}
</section>
{preview}
{editor}"#,
        name = escape_html(&name),
        today = format_long_date(&today),
        count = entries.len(),
        new_href = open_href("/home", Modal::AddEntry, None),
        list = entry_list(&entries),
        preview = preview_modal(&modals, current),
        editor = editor_modal(&modals, current),
    );

    ctx.render("Home", Some(NavPage::Home), &main)
}

fn entry_list(entries: &[StoredEntry]) -> String {
    if entries.is_empty() {
        return r#"<div class="empty-state" id="emptyState">
    <p>No entries yet. Start writing your first journal entry!</p>
  </div>"#
            .to_string();
    }

    let cards: String = entries.iter().map(entry_card).collect();
    format!(r#"<div class="entries-list" id="entriesList">{}</div>"#, cards)
}

fn entry_card(entry: &StoredEntry) -> String {
    format!(
        r#"<a class="entry-card" href="{href}">
      <div class="entry-title">{title}</div>
      <div class="entry-preview">{preview}</div>
      <div class="entry-meta"><span class="entry-date">{date}</span><span class="entry-time">{time}</span></div>
    </a>"#,
        href = escape_html(&open_href("/home", Modal::Preview, Some(entry.id))),
        title = escape_html(&entry.title),
        preview = escape_html(&text_preview(&entry.content)),
        date = format_date(&entry.updated_at),
        time = format_time(&entry.updated_at),
    )
}

fn preview_modal(modals: &ModalState, current: Option<&StoredEntry>) -> String {
    let shown = modals.is_open(Modal::Preview);
    let (title, body) = match current.filter(|_| shown) {
        Some(entry) => (
            entry.title.as_str(),
            format!(
                r#"<p class="preview-date" id="previewDate">Last updated: {date} at {time}</p>
    <div class="preview-content" id="previewContent">{content}</div>
    <div class="modal-actions">
      <a class="btn btn-secondary" href="{edit}">Edit</a>
      <form method="post" action="/home/entries/{id}/delete" data-confirm="Delete this entry? This cannot be undone.">
        <button type="submit" class="btn btn-danger">Delete</button>
      </form>
    </div>"#,
                date = format_date(&entry.updated_at),
                time = format_time(&entry.updated_at),
                // Stored content is already reduced to the formatting allow-list.
                content = entry.content,
                edit = escape_html(&open_href("/home", Modal::EditEntry, Some(entry.id))),
                id = entry.id,
            ),
        ),
        None => ("", String::new()),
    };
    render_modal(
        "previewModal",
        title,
        shown,
        &modals.close_href("/home", Modal::Preview),
        &body,
    )
}

fn editor_modal(modals: &ModalState, current: Option<&StoredEntry>) -> String {
    let editing = current.filter(|_| modals.is_open(Modal::EditEntry));
    let shown = modals.is_open(Modal::AddEntry) || editing.is_some();
    let (heading, id, title, content) = match editing {
        Some(entry) => (
            "Edit Entry",
            entry.id.to_string(),
            escape_html(&entry.title),
            entry.content.as_str(),
        ),
        None => ("New Entry", String::new(), String::new(), ""),
    };

    let body = format!(
        r#"<form method="post" action="/home/entries" class="entry-form" id="entryForm">
      <input type="hidden" name="entry_id" value="{id}">
      <label for="entryTitle">Title</label>
      <input type="text" id="entryTitle" name="title" value="{title}" maxlength="200" required>
      <div class="editor-toolbar" role="toolbar">
        <button type="button" data-command="bold"><b>B</b></button>
        <button type="button" data-command="italic"><i>I</i></button>
        <button type="button" data-command="underline"><u>U</u></button>
        <button type="button" data-command="strikeThrough"><s>S</s></button>
        <button type="button" data-command="insertUnorderedList">&bull; List</button>
        <button type="button" data-command="insertOrderedList">1. List</button>
        <button type="button" data-command="uppercase">AA</button>
      </div>
      <div class="editor" id="entryContent" contenteditable="true" hidden>{content}</div>
      <textarea name="content" id="entryContentInput" class="editor-fallback">{content_escaped}</textarea>
      <button type="submit" class="btn btn-primary">Save Entry</button>
    </form>"#,
        id = id,
        title = title,
        content = content,
        content_escaped = escape_html(content),
    );
    let open = if editing.is_some() {
        Modal::EditEntry
    } else {
        Modal::AddEntry
    };
    render_modal(
        "addEntryModal",
        heading,
        shown,
        &modals.close_href("/home", open),
        &body,
    )
}

/// POST /home/entries
pub async fn save_entry(
    State(state): State<AppState>,
    page: SignedIn,
    Form(form): Form<EntryForm>,
) -> Response {
    let SignedIn { ctx, session } = page;

    let id = match form.entry_id() {
        Ok(id) => id,
        Err(err) => return ctx.fail("/home", "Error saving entry", err),
    };
    let back = match id {
        Some(id) => open_href("/home", Modal::EditEntry, Some(id)),
        None => open_href("/home", Modal::AddEntry, None),
    };

    let request = EntryRequest {
        title: form.title,
        content: form.content,
    };
    if let Err(err) = request.check() {
        return ctx.fail(&back, "Error saving entry", err);
    }

    match state
        .backend
        .save_entry(session.user_id, &request.into_draft(id))
        .await
    {
        Ok(entry) => {
            tracing::info!(user_id = %session.user_id, entry_id = %entry.id, "Entry saved");
            ctx.redirect_with("/home", Flash::success("Entry saved successfully!"))
        }
        Err(err) => ctx.fail(&back, "Error saving entry", err),
    }
}

/// POST /home/entries/{id}/delete
pub async fn delete_entry(
    State(state): State<AppState>,
    page: SignedIn,
    Path(entry_id): Path<Uuid>,
) -> Response {
    let SignedIn { ctx, session } = page;
    match state.backend.delete_entry(session.user_id, entry_id).await {
        Ok(()) => ctx.redirect_with("/home", Flash::success("Entry deleted")),
        Err(err) => ctx.fail("/home", "Error deleting entry", err),
    }
}
