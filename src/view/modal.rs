use serde::Deserialize;
use uuid::Uuid;

use super::render::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modal {
    AddEntry,
    EditEntry,
    Preview,
    ForgotPassword,
    ChangePassword,
}

impl Modal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modal::AddEntry => "add-entry",
            Modal::EditEntry => "edit-entry",
            Modal::Preview => "preview",
            Modal::ForgotPassword => "forgot-password",
            Modal::ChangePassword => "change-password",
        }
    }

    /// Modals that act on the selected entry.
    fn owns_entry(&self) -> bool {
        matches!(self, Modal::EditEntry | Modal::Preview)
    }
}

/// Query string that carries modal state between requests:
/// `?modal=preview&entry=<id>`.
#[derive(Debug, Default, Deserialize)]
pub struct ModalQuery {
    pub modal: Option<Modal>,
    pub entry: Option<Uuid>,
}

/// Which modal is shown and which entry it is showing. Every modal is either
/// shown or hidden, and only `open`/`close` move between the two.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModalState {
    open: Option<Modal>,
    current_entry: Option<Uuid>,
}

impl ModalState {
    pub fn from_query(query: &ModalQuery) -> Self {
        let mut state = Self::default();
        match (query.modal, query.entry) {
            (Some(modal), Some(entry)) if modal.owns_entry() => state.open_entry(modal, entry),
            // An entry modal without an entry has nothing to show.
            (Some(modal), _) if modal.owns_entry() => {}
            (Some(modal), _) => state.open(modal),
            (None, _) => {}
        }
        state
    }

    /// Show a modal that does not act on an entry. Opening the add-entry
    /// modal starts a fresh entry, so any selection is dropped.
    pub fn open(&mut self, modal: Modal) {
        if modal == Modal::AddEntry {
            self.current_entry = None;
        }
        self.open = Some(modal);
    }

    /// Show an entry modal for `entry`, replacing any previous selection.
    pub fn open_entry(&mut self, modal: Modal, entry: Uuid) {
        self.current_entry = Some(entry);
        self.open = Some(modal);
    }

    /// Hide `modal`. Closing an entry modal clears the selection.
    pub fn close(&mut self, modal: Modal) {
        if self.open == Some(modal) {
            self.open = None;
            if modal.owns_entry() || modal == Modal::AddEntry {
                self.current_entry = None;
            }
        }
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        self.open == Some(modal)
    }

    /// Page URL that reproduces this state.
    pub fn href(&self, page: &str) -> String {
        match self.open {
            Some(modal) if modal.owns_entry() => open_href(page, modal, self.current_entry),
            Some(modal) => open_href(page, modal, None),
            None => page.to_string(),
        }
    }

    /// Target of the close button of `modal`: this state with `modal` closed.
    pub fn close_href(&self, page: &str, modal: Modal) -> String {
        let mut next = self.clone();
        next.close(modal);
        next.href(page)
    }

    pub fn current_entry(&self) -> Option<Uuid> {
        self.current_entry
    }
}

/// Link that opens `modal` on `page`, optionally for an entry.
pub fn open_href(page: &str, modal: Modal, entry: Option<Uuid>) -> String {
    match entry {
        Some(id) => format!("{}?modal={}&entry={}", page, modal.as_str(), id),
        None => format!("{}?modal={}", page, modal.as_str()),
    }
}

/// Modal container. `close_href` is the page URL without modal state.
pub fn render_modal(id: &str, title: &str, shown: bool, close_href: &str, body: &str) -> String {
    format!(
        r#"<div class="modal{active}" id="{id}" role="dialog" aria-hidden="{hidden}">
  <div class="modal-content">
    <div class="modal-header">
      <h2>{title}</h2>
      <a class="close-btn" href="{close}" aria-label="Close">&times;</a>
    </div>
    {body}
  </div>
</div>"#,
        active = if shown { " active" } else { "" },
        id = id,
        hidden = !shown,
        title = escape_html(title),
        close = escape_html(close_href),
        body = body,
    )
}
