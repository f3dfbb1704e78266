// ABOUTME: Session lifecycle handlers: list apps, start a session, inspect it, and close it.
// ABOUTME: Starting a session returns the app's welcome message; closing it discards all state.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use switchyard_core::AppKind;

use super::{error_response, find_session};
use crate::app_state::SharedState;

/// One entry in the app list.
#[derive(Debug, Serialize)]
pub struct AppSummary {
    pub app: AppKind,
    pub title: &'static str,
    pub welcome: &'static str,
    pub placeholder: &'static str,
}

/// Request body for starting a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub app: String,
}

/// Response body after starting a session.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub app: AppKind,
    pub welcome: &'static str,
    pub placeholder: &'static str,
}

/// GET /api/apps - List the available chat apps.
pub async fn list_apps(State(state): State<SharedState>) -> impl IntoResponse {
    let apps: Vec<AppSummary> = AppKind::ALL
        .into_iter()
        .filter_map(|kind| state.app(kind))
        .map(|entry| AppSummary {
            app: entry.blueprint.kind,
            title: entry.blueprint.kind.title(),
            welcome: entry.blueprint.welcome,
            placeholder: entry.blueprint.placeholder,
        })
        .collect();

    Json(serde_json::json!({
        "provider": state.provider(),
        "model": state.model(),
        "apps": apps,
    }))
}

/// POST /api/sessions - Start a session of the requested app.
pub async fn create_session(
    State(state): State<SharedState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let kind = match req.app.parse::<AppKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let Some((session_id, entry)) = state.create_session(kind).await else {
        return error_response(StatusCode::NOT_FOUND, "app not available");
    };

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session_id.to_string(),
            app: kind,
            welcome: entry.blueprint.welcome,
            placeholder: entry.blueprint.placeholder,
        }),
    )
        .into_response()
}

/// GET /api/sessions/{id} - History, context, and phase of a session.
/// Waits for any turn in progress to finish.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (_, handle) = match find_session(&state, &id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let chat = handle.lock().await;
    Json(chat.session().clone()).into_response()
}

/// DELETE /api/sessions/{id} - Close a session and drop its state.
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (session_id, _) = match find_session(&state, &id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    state.remove_session(session_id).await;
    StatusCode::NO_CONTENT.into_response()
}
