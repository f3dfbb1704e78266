// ABOUTME: Message handler: runs one turn for a session and returns the reply as JSON.
// ABOUTME: Turn failures are still 200 responses, with ok=false and the "Error: ..." text as the reply.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::{error_response, find_session};
use crate::app_state::SharedState;

/// Request body for sending a user message.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Response body for a completed turn.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

/// POST /api/sessions/{id}/messages - Handle one user message.
pub async fn post_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    if req.content.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message content must not be empty");
    }

    let (_, handle) = match find_session(&state, &id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let outcome = handle.lock().await.handle_message(&req.content, None).await;

    Json(MessageResponse {
        ok: outcome.is_success(),
        reply: outcome.text().to_string(),
        agent: outcome.agent().map(String::from),
    })
    .into_response()
}
