use axum::{
    extract::{Query, State},
    response::Response,
    Form,
};
use serde::Deserialize;

use crate::dto::MoodRequest;
use crate::models::mood::{emoji_for, StoredMood, MOOD_CHOICES};
use crate::view::flash::Flash;
use crate::view::layout::NavPage;
use crate::view::render::{escape_html, format_date, format_long_date};
use crate::AppState;

use super::SignedIn;

#[derive(Debug, Default, Deserialize)]
pub struct MoodQuery {
    /// Selected palette mood; unknown labels are ignored.
    pub mood: Option<String>,
    pub history: Option<String>,
}

impl MoodQuery {
    fn selected(&self) -> Option<&str> {
        self.mood.as_deref().filter(|m| emoji_for(m).is_some())
    }

    fn history_open(&self) -> bool {
        self.history.as_deref() == Some("open")
    }
}

#[derive(Debug, Deserialize)]
pub struct MoodForm {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub note: String,
}

fn mood_href(mood: Option<&str>, history_open: bool) -> String {
    let mut params = Vec::new();
    if let Some(mood) = mood {
        params.push(format!("mood={}", urlencoding::encode(mood)));
    }
    if history_open {
        params.push("history=open".to_string());
    }
    if params.is_empty() {
        "/mood".to_string()
    } else {
        format!("/mood?{}", params.join("&"))
    }
}

/// GET /mood
pub async fn show(
    State(state): State<AppState>,
    page: SignedIn,
    Query(query): Query<MoodQuery>,
) -> Response {
    let SignedIn { ctx, session } = page;
    let selected = query.selected();
    let history_open = query.history_open();

    let history = match state.backend.list_moods(session.user_id).await {
        Ok(moods) => mood_history(&moods),
        Err(err) => super::failure("Error loading mood history", &err).render(),
    };

    let main = format!(
        r#"<section class="main-content">
  <h1>How are you feeling today?</h1>
  <p id="currentDate">{today}</p>
  <div class="mood-grid">{palette}</div>
  <form method="post" action="/mood" class="mood-form">
    <input type="hidden" name="mood" value="{selected}">
    <label for="moodNote">Add a note (optional)</label>
    <textarea id="moodNote" name="note" maxlength="2000" placeholder="What's on your mind?"></textarea>
    <button type="submit" class="btn btn-primary" id="saveMoodBtn"{disabled}>Save Mood</button>
  </form>
  <a class="btn btn-secondary" id="toggleHistoryBtn" href="{toggle_href}">{toggle_label}</a>
  <div class="mood-history{history_class}" id="moodHistory">{history}</div>
</section>"#,
        today = format_long_date(&chrono::Utc::now().date_naive()),
        palette = palette(selected, history_open),
        selected = escape_html(selected.unwrap_or_default()),
        disabled = if selected.is_some() { "" } else { " disabled" },
        toggle_href = escape_html(&mood_href(selected, !history_open)),
        toggle_label = if history_open { "Hide History" } else { "View History" },
        history_class = if history_open { " active" } else { "" },
        history = history,
    );

    ctx.render("Mood Tracker", Some(NavPage::Mood), &main)
}

fn palette(selected: Option<&str>, history_open: bool) -> String {
    MOOD_CHOICES
        .iter()
        .map(|(label, emoji)| {
            let class = if selected == Some(*label) {
                "mood-item selected"
            } else {
                "mood-item"
            };
            format!(
                r#"<a class="{class}" data-mood="{label}" href="{href}"><span class="mood-emoji">{emoji}</span><span class="mood-label">{label}</span></a>"#,
                class = class,
                label = label,
                emoji = emoji,
                href = escape_html(&mood_href(Some(label), history_open)),
            )
        })
        .collect()
}

fn mood_history(moods: &[StoredMood]) -> String {
    if moods.is_empty() {
        return r#"<p class="empty-state">No moods recorded yet.</p>"#.to_string();
    }

    moods
        .iter()
        .map(|mood| {
            let note = match mood.note.as_deref() {
                Some(note) => format!(r#"<div class="mood-history-note">{}</div>"#, escape_html(note)),
                None => String::new(),
            };
            format!(
                r#"<div class="mood-history-item">
      <div class="mood-history-emoji">{emoji}</div>
      <div class="mood-history-content">
        <div class="mood-history-date">{date} - {label}</div>
        {note}
      </div>
    </div>"#,
                emoji = escape_html(&mood.emoji),
                date = format_date(&mood.recorded_at),
                label = escape_html(&mood.mood),
                note = note,
            )
        })
        .collect()
}

/// POST /mood
pub async fn save(
    State(state): State<AppState>,
    page: SignedIn,
    Form(form): Form<MoodForm>,
) -> Response {
    let SignedIn { ctx, session } = page;

    let back = mood_href(Some(form.mood.as_str()).filter(|m| !m.is_empty()), false);
    let request = MoodRequest {
        mood: form.mood,
        emoji: None,
        note: Some(form.note),
    };
    if let Err(err) = request.check() {
        return ctx.fail(&back, "Error saving mood", err);
    }
    let draft = match request.into_draft() {
        Ok(draft) => draft,
        Err(err) => return ctx.fail("/mood", "Error saving mood", err),
    };

    match state
        .backend
        .save_mood(session.user_id, &draft, crate::models::mood::DayKey::today())
        .await
    {
        Ok(mood) => {
            tracing::info!(user_id = %session.user_id, mood = %mood.mood, "Mood saved");
            // Redirecting without `?mood=` clears the selection.
            ctx.redirect_with("/mood", Flash::success("Mood saved successfully!"))
        }
        Err(err) => ctx.fail(&back, "Error saving mood", err),
    }
}
