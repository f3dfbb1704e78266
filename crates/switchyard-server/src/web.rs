// ABOUTME: Web UI handlers serving the chat page and transcript partial via Askama templates.
// ABOUTME: Transcript messages are rendered from markdown, with raw HTML shown as text.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use pulldown_cmark::{Event, Options, Parser, html};

use switchyard_core::{AppKind, ChatMessage, Role};

use crate::api::find_session;
use crate::app_state::SharedState;

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;

/// An app button on the index page.
pub struct AppCard {
    pub slug: &'static str,
    pub title: &'static str,
}

/// Chat page with an app picker.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub apps: Vec<AppCard>,
}

/// GET / - Render the chat page.
pub async fn index() -> IndexTemplate {
    IndexTemplate {
        apps: AppKind::ALL
            .into_iter()
            .map(|kind| AppCard {
                slug: kind.label(),
                title: kind.title(),
            })
            .collect(),
    }
}

/// One rendered transcript message.
pub struct TranscriptEntry {
    pub role: &'static str,
    pub html: String,
}

/// Partial: the conversation so far, for one session.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "partials/transcript.html")]
pub struct TranscriptTemplate {
    pub title: &'static str,
    pub welcome: &'static str,
    pub entries: Vec<TranscriptEntry>,
}

/// Render markdown to HTML. Raw HTML in the source is escaped rather than passed through.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn entry(message: &ChatMessage) -> Option<TranscriptEntry> {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant if !message.content.is_empty() => "assistant",
        _ => return None,
    };
    Some(TranscriptEntry {
        role,
        html: render_markdown(&message.content),
    })
}

/// GET /web/sessions/{id}/transcript - Return the session transcript as an HTML partial.
pub async fn transcript(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (_, handle) = match find_session(&state, &id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let chat = handle.lock().await;
    let app = chat.app();
    let welcome = state
        .app(app)
        .map(|entry| entry.blueprint.welcome)
        .unwrap_or_default();

    TranscriptTemplate {
        title: app.title(),
        welcome,
        entries: chat.history().messages().iter().filter_map(entry).collect(),
    }
    .into_response()
}
