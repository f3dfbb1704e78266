// ABOUTME: SSE handler that runs one turn and streams its RunEvents as they happen.
// ABOUTME: The stream ends after the terminal turn_completed or turn_failed event.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use switchyard_core::RunEvent;

use super::messages::MessageRequest;
use super::{error_response, find_session};
use crate::app_state::SharedState;

/// Convert a run-event receiver into an SSE-compatible stream.
fn event_stream_from_receiver(
    rx: mpsc::UnboundedReceiver<RunEvent>,
) -> impl Stream<Item = Result<SseEvent, axum::Error>> {
    UnboundedReceiverStream::new(rx).filter_map(|event| async move {
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(SseEvent::default().event(event.kind()).data(data)))
    })
}

/// POST /api/sessions/{id}/messages/stream - Handle one user message, streaming progress.
pub async fn stream_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> impl IntoResponse {
    if req.content.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message content must not be empty");
    }

    let (session_id, handle) = match find_session(&state, &id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    // The turn runs to completion even if the client disconnects mid-stream.
    tokio::spawn(async move {
        let mut chat = handle.lock().await;
        let outcome = chat.handle_message(&req.content, Some(&tx)).await;
        tracing::debug!(%session_id, ok = outcome.is_success(), "streamed turn finished");
    });

    Sse::new(event_stream_from_receiver(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}
