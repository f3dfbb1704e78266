// ABOUTME: API module containing the HTTP handlers for the switchyard REST API.
// ABOUTME: Organized into sub-modules for apps and sessions, message turns, and SSE turn streaming.

pub mod messages;
pub mod sessions;
pub mod stream;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ulid::Ulid;

use crate::app_state::{SessionHandle, SharedState};

/// JSON error body with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Resolve a path id to a live session, or the 400/404 response to send instead.
pub(crate) async fn find_session(
    state: &SharedState,
    id: &str,
) -> Result<(Ulid, SessionHandle), Response> {
    let session_id = id
        .parse::<Ulid>()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "invalid session id"))?;

    state
        .session(session_id)
        .await
        .map(|handle| (session_id, handle))
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "session not found"))
}
